//! Opponent range belief.
//!
//! A per-seat categorical over {weak, medium, strong}, uniform at the start
//! of every hand and nudged by each observed action. The belief conditions
//! the hero's equity estimate and tilts the opponent response model.

use serde::Serialize;

use crate::game::Action;

/// Categorical range belief for one seat.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RangeBelief {
    pub weak: f64,
    pub medium: f64,
    pub strong: f64,
}

impl Default for RangeBelief {
    fn default() -> Self {
        Self {
            weak: 1.0 / 3.0,
            medium: 1.0 / 3.0,
            strong: 1.0 / 3.0,
        }
    }
}

impl RangeBelief {
    /// Update from an observed action at a node where the actor either
    /// faced a bet or saw an unopened pot.
    pub fn observe(&mut self, action: Action, facing_bet: bool) {
        let (dw, dm, ds) = if facing_bet {
            match action {
                Action::Fold => (0.20, 0.04, -0.24),
                Action::Call | Action::Check => (-0.05, 0.12, -0.07),
                a if a.is_aggressive() => (-0.16, -0.04, 0.20),
                _ => (0.0, 0.0, 0.0),
            }
        } else {
            match action {
                Action::Check => (0.10, 0.02, -0.12),
                a if a.is_aggressive() => (-0.12, -0.02, 0.14),
                _ => (0.0, 0.0, 0.0),
            }
        };
        self.weak += dw;
        self.medium += dm;
        self.strong += ds;
        self.normalize();
    }

    /// Clamp negatives to zero and rescale to sum 1.
    fn normalize(&mut self) {
        self.weak = self.weak.max(0.0);
        self.medium = self.medium.max(0.0);
        self.strong = self.strong.max(0.0);
        let total = self.weak + self.medium + self.strong;
        if total > 0.0 {
            self.weak /= total;
            self.medium /= total;
            self.strong /= total;
        } else {
            *self = Self::default();
        }
    }

    /// Strong-minus-weak mass, the tilt used by the response model.
    #[must_use]
    pub fn strong_tilt(&self) -> f64 {
        self.strong - self.weak
    }

    /// Hero equity adjusted for what the opponent's actions imply.
    #[must_use]
    pub fn conditioned_equity(&self, hs: f64) -> f64 {
        let shift = -0.11 * self.strong_tilt() + 0.02 * (self.medium - 0.33);
        (hs + shift).clamp(0.001, 0.999)
    }
}
