//! The runtime decision pipeline.
//!
//! One bot turn, start to finish: legality pre-filter, cached equity
//! estimate conditioned on the opponent's range, infoset key, EV/prior
//! blending when the key is trained (preflop falls back to the heuristic
//! mix), the optional realtime subgame, and the conservative override. Every recovery increments a diagnostic counter;
//! the pipeline itself never fails.

use log::warn;
use rand::rngs::StdRng;

use crate::belief::RangeBelief;
use crate::blueprint::{
    blend_scores, softmax_probs, PriorStore, POSTFLOP_TEMPERATURE, PREFLOP_TEMPERATURE,
};
use crate::cards::HandContext;
use crate::config::EngineConfig;
use crate::diag::DiagCounters;
use crate::equity::EquityCache;
use crate::ev;
use crate::game::{Action, HandState, Street};
use crate::infoset::{self, BoardTexture};
use crate::preflop;
use crate::stats::OpponentStats;
use crate::subgame;

/// Equity estimates this extreme with few samples off the river look like
/// evaluator trouble and are counted (but kept).
const SUSPECT_LOW: f64 = 1e-4;
const SUSPECT_HIGH: f64 = 0.9999;
const SUSPECT_SAMPLES: u32 = 1_000;

/// A decided bot action plus the evidence behind it.
#[derive(Debug, Clone)]
pub struct Decision {
    pub action: Action,
    /// Belief-conditioned hand strength used for EV.
    pub hand_strength: f64,
    /// Canonical key looked up in the blueprint.
    pub infoset_key: String,
    pub prior_hit: bool,
    pub used_subgame: bool,
}

/// Decide the acting seat's move.
///
/// `belief` is the actor's belief about the opponent's range; `opp` the
/// opponent's observed tendencies.
#[allow(clippy::too_many_arguments)]
pub fn decide(
    state: &HandState,
    ctx: &HandContext,
    belief: &RangeBelief,
    opp: &OpponentStats,
    prior: &PriorStore,
    cache: &EquityCache,
    config: &EngineConfig,
    diag: &mut DiagCounters,
    rng: &mut StdRng,
) -> Decision {
    let seat = state.to_act;
    let hole = ctx.holes[seat];
    let board = ctx.board_for(state.street);
    let legal = state.legal_actions();
    debug_assert!(!legal.is_empty(), "deciding at a terminal node");

    let eq = cache.estimate(hole, board, None, config.eval_trials(), rng);
    if (eq.value <= SUSPECT_LOW || eq.value >= SUSPECT_HIGH)
        && eq.samples < SUSPECT_SAMPLES
        && state.street != Street::River
    {
        diag.eval_suspect_warnings += 1;
    }

    // Keys use the raw estimate, matching the trainer; EV uses the
    // belief-conditioned strength.
    let infoset_key = infoset::key(state, board, eq.value);
    let hs = belief.conditioned_equity(eq.value);

    let spr = state.spr();
    let req = ev::required_equity(state.pot, state.to_call());
    let (filtered, restored) = ev::prefilter(&legal, hs, spr, req);
    if restored {
        warn!("legality pre-filter emptied the action set; restoring {legal:?}");
        diag.empty_legal_warnings += 1;
    }

    let tex = BoardTexture::classify(board);
    let evs = ev::score_actions(state, tex, hs, belief, opp, &filtered);

    let prior_probs = prior.lookup(&infoset_key);
    let mut prior_hit = false;
    let mut used_subgame = false;

    let mut chosen = if let Some(probs) = prior_probs {
        prior_hit = true;
        diag.prior_hits += 1;
        let temperature = if state.street == Street::Preflop {
            PREFLOP_TEMPERATURE
        } else {
            POSTFLOP_TEMPERATURE
        };
        let scores = blend_scores(&evs, probs, &filtered, config.ev_blend, config.prob_floor);
        if log::log_enabled!(log::Level::Debug) {
            let blended = softmax_probs(&scores, &filtered, temperature);
            log::debug!("blend {infoset_key}: {blended:?}");
        }
        ev::select(&filtered, &scores)
    } else if state.street == Street::Preflop {
        diag.prior_misses += 1;
        let tier = preflop::classify(hole);
        let weights = preflop::mix_weights(tier, state.raises > 0, hs, opp, &filtered);
        preflop::blend_sample(&filtered, &evs, &weights, rng)
    } else {
        diag.prior_misses += 1;
        ev::select(&filtered, &evs)
    };

    if subgame::should_trigger(state, config) {
        if filtered.len() > 1 {
            let result =
                subgame::solve(state, tex, hs, belief, opp, prior_probs, config, rng);
            chosen = result.chosen;
            used_subgame = true;
            diag.rt_subgame_used += 1;
        } else {
            diag.rt_subgame_fallbacks += 1;
        }
    }

    if state.street != Street::Preflop {
        chosen = ev::conservative_override(chosen, &filtered, tex, hs, spr, req);
    }

    Decision {
        action: chosen,
        hand_strength: hs,
        infoset_key,
        prior_hit,
        used_subgame,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::PolicyTable;
    use rand::SeedableRng;
    use test_macros::timed_test;

    fn fixtures() -> (EngineConfig, EquityCache, PriorStore, DiagCounters, StdRng) {
        let config = EngineConfig::default();
        let cache = EquityCache::new(config.equity_cache_entries);
        (
            config,
            cache,
            PriorStore::empty(),
            DiagCounters::default(),
            StdRng::seed_from_u64(41),
        )
    }

    #[timed_test(10)]
    fn preflop_decision_is_legal() {
        let (config, cache, prior, mut diag, mut rng) = fixtures();
        let ctx = HandContext::deal(&mut rng);
        let state = HandState::new(&config);
        let decision = decide(
            &state,
            &ctx,
            &RangeBelief::default(),
            &OpponentStats::default(),
            &prior,
            &cache,
            &config,
            &mut diag,
            &mut rng,
        );
        assert!(state.legal_actions().contains(&decision.action));
        assert!(decision.infoset_key.starts_with("preflop|"));
        assert!(!decision.used_subgame);
    }

    #[timed_test(10)]
    fn postflop_miss_counts_and_uses_ev_path() {
        let (config, cache, prior, mut diag, mut rng) = fixtures();
        let ctx = HandContext::deal(&mut rng);
        let mut state = HandState::new(&config);
        state.apply(Action::Call);
        state.apply(Action::Check);
        let decision = decide(
            &state,
            &ctx,
            &RangeBelief::default(),
            &OpponentStats::default(),
            &prior,
            &cache,
            &config,
            &mut diag,
            &mut rng,
        );
        assert!(state.legal_actions().contains(&decision.action));
        assert!(!decision.prior_hit);
        assert_eq!(diag.prior_misses, 1);
        assert_eq!(diag.prior_hits, 0);
    }

    #[timed_test(10)]
    fn preflop_prior_hit_blends_instead_of_mixing() {
        let (config, cache, _, mut diag, mut rng) = fixtures();
        let ctx = HandContext::deal(&mut rng);
        let state = HandState::new(&config);

        // Cover every hs band at the opening node; the prior puts all its
        // mass on folding.
        let mut table = PolicyTable::new();
        for band in 0..10 {
            let key = infoset::key(&state, &[], f64::from(band) / 10.0 + 0.05);
            let mut probs = [0.0; 8];
            probs[Action::Fold.index()] = 1.0;
            table.insert(key, probs);
        }
        let prior = PriorStore::from_table(table);

        let decision = decide(
            &state,
            &ctx,
            &RangeBelief::default(),
            &OpponentStats::default(),
            &prior,
            &cache,
            &config,
            &mut diag,
            &mut rng,
        );
        assert!(decision.prior_hit);
        assert_eq!(diag.prior_hits, 1);
        assert_eq!(diag.prior_misses, 0);
        assert!(state.legal_actions().contains(&decision.action));
    }

    #[timed_test(10)]
    fn postflop_prior_hit_is_counted() {
        let (config, cache, _, mut diag, mut rng) = fixtures();
        let ctx = HandContext::deal(&mut rng);
        let mut state = HandState::new(&config);
        state.apply(Action::Call);
        state.apply(Action::Check);

        // Seed the store with every key reachable at this node's hs bands.
        let board = ctx.board_for(state.street);
        let mut table = PolicyTable::new();
        for band in 0..10 {
            let key = infoset::key(&state, board, f64::from(band) / 10.0 + 0.05);
            let mut probs = [0.0; 8];
            probs[Action::Check.index()] = 1.0;
            table.insert(key, probs);
        }
        let prior = PriorStore::from_table(table);

        let decision = decide(
            &state,
            &ctx,
            &RangeBelief::default(),
            &OpponentStats::default(),
            &prior,
            &cache,
            &config,
            &mut diag,
            &mut rng,
        );
        assert!(decision.prior_hit);
        assert_eq!(diag.prior_hits, 1);
    }

    #[timed_test(10)]
    fn big_turn_spot_runs_the_subgame() {
        let (mut config, cache, prior, mut diag, mut rng) = fixtures();
        config.rt_subgame_ms = 200;
        let ctx = HandContext::deal(&mut rng);
        let mut state = HandState::new(&config);
        state.apply(Action::RaisePot);
        state.apply(Action::Call);
        state.apply(Action::BetPot);
        state.apply(Action::Call);
        state.apply(Action::BetPot);
        assert!(subgame::should_trigger(&state, &config));
        let decision = decide(
            &state,
            &ctx,
            &RangeBelief::default(),
            &OpponentStats::default(),
            &prior,
            &cache,
            &config,
            &mut diag,
            &mut rng,
        );
        assert!(decision.used_subgame);
        assert_eq!(diag.rt_subgame_used, 1);
        assert!(state.legal_actions().contains(&decision.action));
    }
}
