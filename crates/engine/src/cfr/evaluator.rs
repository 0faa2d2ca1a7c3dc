//! Policy evaluation against the fixed opponent profiles.
//!
//! Plays full hands between the exported policy and each profile,
//! alternating the bot's seat, and reports bot EV per hand in big blinds.
//! The four profiles run in parallel; each gets its own seeded RNG so a
//! checkpoint's evaluation is reproducible.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::blueprint::{project_prior, EvalSummary, PolicyTable};
use crate::cards::HandContext;
use crate::config::EngineConfig;
use crate::equity;
use crate::ev;
use crate::game::{Action, HandState, Street};
use crate::infoset;
use crate::preflop;
use crate::stats::OpponentStats;

use super::profiles::Profile;

/// Evaluation harness bundling the policy under test with its game config.
pub struct Evaluator<'a> {
    policy: &'a PolicyTable,
    config: &'a EngineConfig,
    trials: u32,
}

impl<'a> Evaluator<'a> {
    #[must_use]
    pub fn new(policy: &'a PolicyTable, config: &'a EngineConfig) -> Self {
        Self {
            policy,
            config,
            trials: config.train_trials(),
        }
    }

    /// Mean bot EV per hand (in big blinds) over `hands` hands vs `profile`.
    #[must_use]
    pub fn play_profile(&self, profile: Profile, hands: u32, seed: u64) -> f64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut total = 0.0;
        for hand_idx in 0..hands {
            let bot_seat = (hand_idx % 2) as usize;
            let ctx = HandContext::deal(&mut rng);
            let mut state = HandState::new(self.config);
            while !state.terminal {
                let seat = state.to_act;
                let legal = state.legal_actions();
                let action = if seat == bot_seat {
                    self.bot_action(&state, &ctx, &mut rng)
                } else {
                    profile.act(&legal, state.to_call(), state.pot, &mut rng)
                };
                state.apply(action);
            }
            let settlement = state.settle(&ctx, self.config);
            total += settlement.payoffs[bot_seat] / self.config.big_blind;
        }
        total / f64::from(hands.max(1))
    }

    /// The policy bot's move: heuristic mix preflop, policy lookup with an
    /// EV-scoring fallback postflop.
    fn bot_action(&self, state: &HandState, ctx: &HandContext, rng: &mut StdRng) -> Action {
        let seat = state.to_act;
        let hole = ctx.holes[seat];
        let board = ctx.board_for(state.street);
        let legal = state.legal_actions();
        let eq = equity::estimate(&hole, board, None, self.trials, rng);

        if state.street == Street::Preflop {
            let tier = preflop::classify(hole);
            let weights = preflop::mix_weights(
                tier,
                state.raises > 0,
                eq.value,
                &OpponentStats::default(),
                &legal,
            );
            return preflop::sample_mix(&legal, &weights, rng);
        }

        let key = infoset::key(state, board, eq.value);
        if let Some(prior) = self.policy.lookup(&key) {
            let projected = project_prior(prior, &legal);
            let mut best = legal[0];
            for &action in &legal {
                if projected[action.index()] > projected[best.index()] {
                    best = action;
                }
            }
            best
        } else {
            let tex = infoset::BoardTexture::classify(board);
            let evs = ev::score_actions(
                state,
                tex,
                eq.value,
                &crate::belief::RangeBelief::default(),
                &OpponentStats::default(),
                &legal,
            );
            ev::select(&legal, &evs)
        }
    }
}

/// Evaluate the policy against all four profiles in parallel.
#[must_use]
pub fn evaluate_profiles(
    policy: &PolicyTable,
    config: &EngineConfig,
    hands_per_profile: u32,
    seed: u64,
) -> EvalSummary {
    let per_profile: Vec<(String, f64)> = Profile::ALL
        .par_iter()
        .enumerate()
        .map(|(i, &profile)| {
            let evaluator = Evaluator::new(policy, config);
            let ev = evaluator.play_profile(profile, hands_per_profile, seed ^ (i as u64 + 1));
            (profile.name().to_string(), ev)
        })
        .collect();

    #[allow(clippy::cast_precision_loss)]
    let aggregate =
        per_profile.iter().map(|(_, ev)| ev).sum::<f64>() / per_profile.len().max(1) as f64;
    EvalSummary {
        per_profile,
        aggregate,
    }
}
