//! Runtime prior store and EV/prior score blending.
//!
//! The store wraps a loaded [`PolicyTable`]; it is read-only after load and
//! safe to share. Blending combines closed-form EV with the log of the
//! prior probability, then a low-temperature softmax turns scores into
//! probabilities for logging and sampling.

use std::path::Path;

use crate::error::PolicyError;
use crate::game::{Action, Actions, NUM_ACTIONS};

use super::{PolicyFile, PolicyTable};

/// Softmax temperature for postflop blended scores.
pub const POSTFLOP_TEMPERATURE: f64 = 0.30;
/// Softmax temperature for preflop blended scores.
pub const PREFLOP_TEMPERATURE: f64 = 0.40;

/// Read-only blueprint prior, shared across sessions.
#[derive(Debug, Default)]
pub struct PriorStore {
    table: PolicyTable,
}

impl PriorStore {
    /// An empty store; every lookup misses.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap an in-memory policy table.
    #[must_use]
    pub fn from_table(table: PolicyTable) -> Self {
        Self { table }
    }

    /// Load the policy from a strategy file, ignoring its meta block.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed.
    pub fn load(path: &Path) -> Result<Self, PolicyError> {
        let file = PolicyFile::load(path)?;
        Ok(Self {
            table: file.policy,
        })
    }

    /// Prior probabilities for an infoset key; `None` when untrained.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&[f64; NUM_ACTIONS]> {
        self.table.lookup(key)
    }

    /// Number of stored infosets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Blend EV with the log prior: `ev_blend·EV + (1−ev_blend)·ln(max(floor, prior))`.
///
/// Illegal slots stay at negative infinity.
#[must_use]
pub fn blend_scores(
    evs: &[f64; NUM_ACTIONS],
    prior: &[f64; NUM_ACTIONS],
    legal: &Actions,
    ev_blend: f64,
    floor: f64,
) -> [f64; NUM_ACTIONS] {
    let mut scores = [f64::NEG_INFINITY; NUM_ACTIONS];
    for &action in legal {
        let i = action.index();
        scores[i] = ev_blend * evs[i] + (1.0 - ev_blend) * prior[i].max(floor).ln();
    }
    scores
}

/// Softmax over the legal slots of a score vector.
///
/// Returns a probability vector that is zero on illegal actions and sums
/// to one over the legal set.
#[must_use]
pub fn softmax_probs(
    scores: &[f64; NUM_ACTIONS],
    legal: &Actions,
    temperature: f64,
) -> [f64; NUM_ACTIONS] {
    let mut probs = [0.0; NUM_ACTIONS];
    if legal.is_empty() {
        return probs;
    }
    let max = legal
        .iter()
        .map(|a| scores[a.index()])
        .fold(f64::NEG_INFINITY, f64::max);
    let mut total = 0.0;
    for &action in legal {
        let e = ((scores[action.index()] - max) / temperature).exp();
        probs[action.index()] = e;
        total += e;
    }
    for &action in legal {
        probs[action.index()] /= total;
    }
    probs
}

/// Project a prior onto the legal set and renormalize; uniform when the
/// prior has no mass there.
#[must_use]
pub fn project_prior(prior: &[f64; NUM_ACTIONS], legal: &Actions) -> [f64; NUM_ACTIONS] {
    let mut out = [0.0; NUM_ACTIONS];
    let mut total = 0.0;
    for &action in legal {
        out[action.index()] = prior[action.index()].max(0.0);
        total += out[action.index()];
    }
    if total > 0.0 {
        for &action in legal {
            out[action.index()] /= total;
        }
    } else {
        #[allow(clippy::cast_precision_loss)]
        let uniform = 1.0 / legal.len().max(1) as f64;
        for &action in legal {
            out[action.index()] = uniform;
        }
    }
    out
}
