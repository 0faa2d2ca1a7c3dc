//! Realtime subgame solver.
//!
//! A short, wall-clock-bounded DCFR run over the current node's legal
//! actions, seeded by the blueprint prior. Leaves are scored by the
//! closed-form EV model plus a small Gaussian perturbation, a depth
//! continuation term, and a stack-tension penalty, instead of terminal
//! enumeration. The loop exits cleanly when the budget expires and always
//! returns a complete averaged strategy.

use std::time::Instant;

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::belief::RangeBelief;
use crate::blueprint::project_prior;
use crate::cfr::{regret_match, DcfrSchedule};
use crate::config::EngineConfig;
use crate::ev;
use crate::game::{Action, HandState, Street, NUM_ACTIONS};
use crate::infoset::BoardTexture;
use crate::stats::OpponentStats;

/// Hard iteration cap behind the wall-clock budget.
const MAX_ITERATIONS: u32 = 50_000;

/// Output of a subgame solve.
#[derive(Debug, Clone)]
pub struct SubgameResult {
    /// Averaged strategy: zero on illegal actions, sums to one over legal.
    pub probs: [f64; NUM_ACTIONS],
    /// Argmax of `probs`.
    pub chosen: Action,
    /// DCFR iterations completed within the budget.
    pub iterations: u32,
}

/// Whether the realtime solve should run at this node.
///
/// Turn or river only, with either a swollen pot or a shallow SPR, and
/// only while both seats can still bet.
#[must_use]
pub fn should_trigger(state: &HandState, config: &EngineConfig) -> bool {
    if state.terminal {
        return false;
    }
    if !matches!(state.street, Street::Turn | Street::River) {
        return false;
    }
    if state.stack[0] <= 0.0 || state.stack[1] <= 0.0 {
        return false;
    }
    state.pot >= config.rt_trigger_pot || state.spr() <= config.rt_trigger_spr
}

/// Run the time-budgeted solve at the current state.
pub fn solve<R: Rng>(
    state: &HandState,
    tex: BoardTexture,
    hs: f64,
    belief: &RangeBelief,
    opp: &OpponentStats,
    prior: Option<&[f64; NUM_ACTIONS]>,
    config: &EngineConfig,
    rng: &mut R,
) -> SubgameResult {
    let legal = state.legal_actions();
    debug_assert!(!legal.is_empty());

    let prior_probs = match prior {
        Some(p) => project_prior(p, &legal),
        None => {
            let uniform = [0.0; NUM_ACTIONS];
            project_prior(&uniform, &legal)
        }
    };

    let base_evs = ev::score_actions(state, tex, hs, belief, opp, &legal);
    let schedule = DcfrSchedule::default();
    let noise = Normal::new(0.0, 0.004 * state.pot.max(1.0)).ok();

    let depth = f64::from(config.rt_subgame_depth.max(1));
    let continuation =
        (hs - 0.5 - 0.25 * belief.strong_tilt()) * state.pot * 0.24 * (depth - 1.0) / depth;
    let prior_weight = config.rt_prior_weight;

    let mut regrets = [0.0; NUM_ACTIONS];
    let mut strategy_sum = [0.0; NUM_ACTIONS];
    let budget_ms = u128::from(config.subgame_budget_ms());
    let started = Instant::now();
    let mut iterations = 0u32;

    while started.elapsed().as_millis() < budget_ms && iterations < MAX_ITERATIONS {
        iterations += 1;

        // Current strategy: regret matching blended toward the prior.
        let matched = regret_match(&regrets, &legal);
        let mut sigma = [0.0; NUM_ACTIONS];
        for &action in &legal {
            let i = action.index();
            sigma[i] = (1.0 - prior_weight) * matched[i] + prior_weight * prior_probs[i];
        }

        // Leaf values: EV model + noise + continuation - tension.
        let mut utils = [0.0; NUM_ACTIONS];
        let mut node_util = 0.0;
        for &action in &legal {
            let i = action.index();
            let mut u = base_evs[i] + noise.map_or(0.0, |n| n.sample(rng));
            if action != Action::Fold {
                u += continuation;
            }
            if action.is_aggressive() {
                let pay = state.target_commit(action) - state.commit[state.to_act];
                u -= 0.06 * (pay / state.pot.max(1.0)) * pay;
            }
            utils[i] = u;
            node_util += sigma[i] * u;
        }

        schedule.discount(&mut regrets, u64::from(iterations));
        for &action in &legal {
            let i = action.index();
            regrets[i] += utils[i] - node_util;
            strategy_sum[i] += sigma[i];
        }
    }

    // Average strategy over the legal set; uniform if nothing accumulated.
    let total: f64 = legal.iter().map(|a| strategy_sum[a.index()]).sum();
    let mut probs = [0.0; NUM_ACTIONS];
    if total > 0.0 {
        for &action in &legal {
            probs[action.index()] = strategy_sum[action.index()] / total;
        }
    } else {
        #[allow(clippy::cast_precision_loss)]
        let uniform = 1.0 / legal.len() as f64;
        for &action in &legal {
            probs[action.index()] = uniform;
        }
    }

    let chosen = legal
        .iter()
        .copied()
        .max_by(|a, b| {
            probs[a.index()]
                .partial_cmp(&probs[b.index()])
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(legal[0]);

    SubgameResult {
        probs,
        chosen,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use test_macros::timed_test;

    /// Drive a hand to the turn with a pot-size bet pending.
    fn big_turn_spot() -> HandState {
        let cfg = EngineConfig::default();
        let mut state = HandState::new(&cfg);
        state.apply(Action::RaisePot); // to 8
        state.apply(Action::Call);
        state.apply(Action::BetPot); // flop: pot 16, bet 16
        state.apply(Action::Call);
        state.apply(Action::BetPot); // turn: pot 48, bet 48
        state
    }

    #[timed_test]
    fn trigger_requires_turn_or_river() {
        let cfg = EngineConfig::default();
        let state = HandState::new(&cfg);
        assert!(!should_trigger(&state, &cfg));
    }

    #[timed_test]
    fn trigger_fires_on_big_turn_pots() {
        let cfg = EngineConfig::default();
        let state = big_turn_spot();
        assert_eq!(state.street, Street::Turn);
        assert!(state.pot >= cfg.rt_trigger_pot || state.spr() <= cfg.rt_trigger_spr);
        assert!(should_trigger(&state, &cfg));
    }

    #[timed_test]
    fn trigger_skips_small_shallow_free_spots() {
        let mut cfg = EngineConfig::default();
        cfg.rt_trigger_pot = 1e9;
        cfg.rt_trigger_spr = 0.0;
        let state = big_turn_spot();
        assert!(!should_trigger(&state, &cfg));
    }

    #[timed_test(5)]
    fn solve_returns_distribution_over_legal() {
        let mut cfg = EngineConfig::default();
        cfg.rt_subgame_ms = 200;
        let state = big_turn_spot();
        let legal = state.legal_actions();
        let mut rng = StdRng::seed_from_u64(31);
        let result = solve(
            &state,
            BoardTexture::default(),
            0.62,
            &RangeBelief::default(),
            &OpponentStats::default(),
            None,
            &cfg,
            &mut rng,
        );
        let sum: f64 = result.probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        for action in Action::ALL {
            if !legal.contains(&action) {
                assert!(result.probs[action.index()].abs() < 1e-12);
            }
        }
        assert!(legal.contains(&result.chosen));
        assert!(result.iterations > 0);
    }

    #[timed_test(5)]
    fn solve_respects_its_budget() {
        let mut cfg = EngineConfig::default();
        cfg.rt_subgame_ms = 200;
        let state = big_turn_spot();
        let mut rng = StdRng::seed_from_u64(32);
        let started = Instant::now();
        let _ = solve(
            &state,
            BoardTexture::default(),
            0.5,
            &RangeBelief::default(),
            &OpponentStats::default(),
            None,
            &cfg,
            &mut rng,
        );
        // 10% slack over the 200ms clamp floor.
        assert!(started.elapsed().as_millis() <= 330);
    }

    #[timed_test(5)]
    fn strong_hands_solve_toward_continuing() {
        let mut cfg = EngineConfig::default();
        cfg.rt_subgame_ms = 200;
        let state = big_turn_spot();
        let mut rng = StdRng::seed_from_u64(33);
        let result = solve(
            &state,
            BoardTexture::default(),
            0.92,
            &RangeBelief::default(),
            &OpponentStats::default(),
            None,
            &cfg,
            &mut rng,
        );
        assert!(
            result.probs[Action::Fold.index()] < 0.3,
            "fold prob {} too high for a monster",
            result.probs[Action::Fold.index()]
        );
    }

    #[timed_test(5)]
    fn prior_seeds_the_average() {
        let mut cfg = EngineConfig::default();
        cfg.rt_subgame_ms = 200;
        let state = big_turn_spot();
        let mut prior = [0.0; NUM_ACTIONS];
        prior[Action::Call.index()] = 1.0;
        let mut rng = StdRng::seed_from_u64(34);
        let result = solve(
            &state,
            BoardTexture::default(),
            0.5,
            &RangeBelief::default(),
            &OpponentStats::default(),
            Some(&prior),
            &cfg,
            &mut rng,
        );
        // With prior weight 0.65, call keeps a large floor in the average.
        assert!(result.probs[Action::Call.index()] > 0.3);
    }
}
