//! Diagnostic counters.
//!
//! Every locally-recovered condition increments a counter here; the engine
//! exposes a snapshot through `diag()`. Nothing in this module affects
//! play.

use serde::Serialize;

/// Engine-wide diagnostic counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiagCounters {
    /// Board length disagreed with the street and was re-sliced.
    pub board_invariant_warnings: u64,
    /// Extreme equity from few samples on a non-river board.
    pub eval_suspect_warnings: u64,
    /// Transitions clamped to the feasible boundary.
    pub illegal_state_warnings: u64,
    /// The pre-filter emptied the legal set and it was restored.
    pub empty_legal_warnings: u64,
    /// Blueprint lookups that found a prior.
    pub prior_hits: u64,
    /// Blueprint lookups that missed.
    pub prior_misses: u64,
    /// Realtime subgame solves that ran.
    pub rt_subgame_used: u64,
    /// Trigger spots where the solve was skipped.
    pub rt_subgame_fallbacks: u64,
    /// Equity cache hits (snapshot).
    pub equity_cache_hits: u64,
    /// Equity cache rollouts (snapshot).
    pub equity_cache_rollouts: u64,
}
