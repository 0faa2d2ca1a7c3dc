//! Observed opponent action frequencies.
//!
//! Counters persist across hands within a session and feed both the preflop
//! mix (3-bet tendency) and the postflop response model (fold/call/raise
//! rates vs bets). Rates only tilt decisions once enough samples exist.

use serde::Serialize;

use crate::game::{Action, Street};

/// Samples required before an observed rate influences decisions.
pub const MIN_TENDENCY_SAMPLES: u32 = 8;

/// Per-street reactions to facing a bet or raise.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StreetReactions {
    pub facing_bet: u32,
    pub fold_vs_bet: u32,
    pub call_vs_bet: u32,
    pub raise_vs_bet: u32,
}

impl StreetReactions {
    /// Observed (fold, call, raise) rates, once enough samples exist.
    #[must_use]
    pub fn rates(&self) -> Option<[f64; 3]> {
        if self.facing_bet < MIN_TENDENCY_SAMPLES {
            return None;
        }
        let n = f64::from(self.facing_bet);
        Some([
            f64::from(self.fold_vs_bet) / n,
            f64::from(self.call_vs_bet) / n,
            f64::from(self.raise_vs_bet) / n,
        ])
    }
}

/// Per-seat observed tendencies, accumulated across a session's hands.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OpponentStats {
    /// Preflop nodes where the seat faced a raise.
    pub facing_raise_pf: u32,
    /// Re-raises at those nodes.
    pub threebet_pf: u32,
    /// Flat calls at those nodes.
    pub call_vs_raise_pf: u32,
    /// Flop/turn/river reactions when facing a bet.
    pub postflop: [StreetReactions; 3],
}

impl OpponentStats {
    /// Record a preflop action taken while facing a raise.
    pub fn record_preflop_vs_raise(&mut self, action: Action) {
        self.facing_raise_pf += 1;
        match action {
            Action::RaiseHalf | Action::RaisePot | Action::AllIn => self.threebet_pf += 1,
            Action::Call => self.call_vs_raise_pf += 1,
            _ => {}
        }
    }

    /// Record a postflop action taken while facing a bet.
    pub fn record_postflop_vs_bet(&mut self, street: Street, action: Action) {
        let Some(slot) = street.index().checked_sub(1).and_then(|i| self.postflop.get_mut(i))
        else {
            return;
        };
        slot.facing_bet += 1;
        match action {
            Action::Fold => slot.fold_vs_bet += 1,
            Action::Call | Action::Check => slot.call_vs_bet += 1,
            a if a.is_aggressive() => slot.raise_vs_bet += 1,
            _ => {}
        }
    }

    /// Observed 3-bet rate, once enough facing-raise samples exist.
    #[must_use]
    pub fn threebet_rate(&self) -> Option<f64> {
        if self.facing_raise_pf < MIN_TENDENCY_SAMPLES {
            return None;
        }
        Some(f64::from(self.threebet_pf) / f64::from(self.facing_raise_pf))
    }

    /// Observed call-vs-raise rate over the same samples.
    #[must_use]
    pub fn call_vs_raise_rate(&self) -> Option<f64> {
        if self.facing_raise_pf < MIN_TENDENCY_SAMPLES {
            return None;
        }
        Some(f64::from(self.call_vs_raise_pf) / f64::from(self.facing_raise_pf))
    }

    /// Reactions for a postflop street, if any.
    #[must_use]
    pub fn reactions(&self, street: Street) -> Option<&StreetReactions> {
        street.index().checked_sub(1).and_then(|i| self.postflop.get(i))
    }
}
