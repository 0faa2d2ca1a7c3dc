//! The blueprint trainer: external-sampling discounted CFR with
//! checkpointing and plateau-based early stopping.
//!
//! Each iteration deals a fresh hand, fast-forwards preflop with the
//! heuristic mix for both seats, then runs CFR from the postflop root for
//! the alternating traverser: the traverser explores every legal child,
//! the opponent samples one from its current strategy. Terminal utilities
//! are stack deltas in big blinds.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

use crate::blueprint::{
    CheckpointRecord, PolicyFile, PolicyMeta, PolicyTable, StopReason,
};
use crate::cards::HandContext;
use crate::config::{EngineConfig, ABSTRACTION_VERSION};
use crate::equity::EquityCache;
use crate::game::{HandState, Street, NUM_ACTIONS};
use crate::infoset;
use crate::preflop;
use crate::stats::OpponentStats;

use super::dcfr::DcfrSchedule;
use super::evaluator::evaluate_profiles;
use super::nodes::{regret_match, NodeTable};

/// Checkpoints considered by the plateau test.
const PLATEAU_WINDOW: usize = 3;

/// A training run's parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Target iteration count.
    pub iterations: u64,
    pub seed: u64,
    /// Checkpoint (export + evaluate) cadence in iterations.
    pub checkpoint_every: u64,
    pub eval_hands_per_profile: u32,
    /// No early stop before this many iterations.
    pub min_iters_before_stop: u64,
    /// L1 drift at or below which a checkpoint looks converged.
    pub drift_plateau: f64,
    /// Aggregate-EV range at or below which evaluation looks flat.
    pub ev_plateau: f64,
    /// Game model shared with the runtime.
    pub engine: EngineConfig,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            iterations: 20_000,
            seed: 1,
            checkpoint_every: 1_000,
            eval_hands_per_profile: 200,
            min_iters_before_stop: 3_000,
            drift_plateau: 0.015,
            ev_plateau: 0.02,
            engine: EngineConfig::default(),
        }
    }
}

/// Mean L1 distance between two policies over the union of their keys.
///
/// A key missing on one side compares against the zero vector, so newly
/// discovered infosets register as drift instead of vanishing from the
/// metric.
#[must_use]
pub fn policy_drift(prev: &PolicyTable, curr: &PolicyTable) -> f64 {
    let zero = [0.0; NUM_ACTIONS];
    let mut total = 0.0;
    let mut count = 0u64;

    for (key, prev_probs) in prev.iter() {
        let curr_probs = curr.lookup(key).unwrap_or(&zero);
        total += l1(prev_probs, curr_probs);
        count += 1;
    }
    for (key, curr_probs) in curr.iter() {
        if prev.lookup(key).is_none() {
            total += l1(curr_probs, &zero);
            count += 1;
        }
    }

    if count == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        {
            total / count as f64
        }
    }
}

fn l1(a: &[f64; NUM_ACTIONS], b: &[f64; NUM_ACTIONS]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}

/// Discounted-CFR blueprint trainer.
pub struct BlueprintTrainer {
    config: TrainerConfig,
    schedule: DcfrSchedule,
    nodes: NodeTable,
    cache: EquityCache,
    rng: StdRng,
    trials: u32,
    checkpoints: Vec<CheckpointRecord>,
    prev_export: Option<PolicyTable>,
    iterations_done: u64,
}

impl BlueprintTrainer {
    #[must_use]
    pub fn new(config: TrainerConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        let trials = config.engine.train_trials();
        let cache = EquityCache::new(config.engine.equity_cache_entries);
        Self {
            config,
            schedule: DcfrSchedule::default(),
            nodes: NodeTable::new(),
            cache,
            rng,
            trials,
            checkpoints: Vec::new(),
            prev_export: None,
            iterations_done: 0,
        }
    }

    /// Run to completion and produce the strategy file.
    pub fn run(&mut self) -> PolicyFile {
        self.run_with_progress(|_| {})
    }

    /// Run, invoking `on_checkpoint` after each checkpoint record.
    pub fn run_with_progress<F>(&mut self, mut on_checkpoint: F) -> PolicyFile
    where
        F: FnMut(&CheckpointRecord),
    {
        let started = Instant::now();
        let mut stop_reason = StopReason::TargetIterationsReached;

        for t in 1..=self.config.iterations {
            let traverser = (t % 2) as usize;
            self.iterate(t, traverser);
            self.iterations_done = t;

            if t % self.config.checkpoint_every == 0 {
                let record = self.checkpoint(t, started.elapsed().as_secs_f64());
                on_checkpoint(&record);
                if t >= self.config.min_iters_before_stop && self.plateaued() {
                    stop_reason = StopReason::PlateauReached;
                    break;
                }
            }
        }

        self.export_file(stop_reason)
    }

    /// Infoset count so far.
    #[must_use]
    pub fn infosets(&self) -> usize {
        self.nodes.len()
    }

    /// Iterations completed so far.
    #[must_use]
    pub fn iterations_done(&self) -> u64 {
        self.iterations_done
    }

    /// One training iteration: deal, preflop fast-forward, postflop CFR.
    fn iterate(&mut self, t: u64, traverser: usize) {
        let ctx = HandContext::deal(&mut self.rng);
        let mut state = HandState::new(&self.config.engine);

        while !state.terminal && state.street == Street::Preflop {
            let seat = state.to_act;
            let legal = state.legal_actions();
            let eq = self
                .cache
                .estimate(ctx.holes[seat], &[], None, self.trials, &mut self.rng);
            let tier = preflop::classify(ctx.holes[seat]);
            let weights = preflop::mix_weights(
                tier,
                state.raises > 0,
                eq.value,
                &OpponentStats::default(),
                &legal,
            );
            let action = preflop::sample_mix(&legal, &weights, &mut self.rng);
            state.apply(action);
        }

        // Folded or ran out all-in preflop: nothing to update.
        if state.terminal || state.street == Street::Preflop {
            return;
        }
        self.traverse(&state, &ctx, traverser, t);
    }

    /// External-sampling CFR traversal; returns utility for the traverser
    /// in big blinds.
    fn traverse(&mut self, state: &HandState, ctx: &HandContext, traverser: usize, t: u64) -> f64 {
        if state.terminal {
            let settlement = state.settle(ctx, &self.config.engine);
            return settlement.payoffs[traverser] / self.config.engine.big_blind;
        }

        let seat = state.to_act;
        let legal = state.legal_actions();
        let board = ctx.board_for(state.street);
        let eq = self
            .cache
            .estimate(ctx.holes[seat], board, None, self.trials, &mut self.rng);
        let key = infoset::key(state, board, eq.value);
        let id = self.nodes.visit(&key, &legal);
        let strategy = regret_match(&self.nodes.get(id).regrets, &legal);

        {
            let node = self.nodes.get_mut(id);
            for &action in &legal {
                node.strategy_sum[action.index()] += strategy[action.index()];
            }
        }

        if seat == traverser {
            let mut utils = [0.0; NUM_ACTIONS];
            let mut node_util = 0.0;
            for &action in &legal {
                let mut child = state.clone();
                child.apply(action);
                let u = self.traverse(&child, ctx, traverser, t);
                utils[action.index()] = u;
                node_util += strategy[action.index()] * u;
            }

            let schedule = self.schedule;
            let node = self.nodes.get_mut(id);
            schedule.discount(&mut node.regrets, t);
            for &action in &legal {
                node.regrets[action.index()] += utils[action.index()] - node_util;
            }
            node_util
        } else {
            let action = preflop::sample_mix(&legal, &strategy, &mut self.rng);
            let mut child = state.clone();
            child.apply(action);
            self.traverse(&child, ctx, traverser, t)
        }
    }

    /// Export, measure drift, evaluate, and record one checkpoint.
    fn checkpoint(&mut self, iteration: u64, elapsed_secs: f64) -> CheckpointRecord {
        let export = self.nodes.export_policy();
        let drift = self
            .prev_export
            .as_ref()
            .map_or(1.0, |prev| policy_drift(prev, &export));
        let eval = evaluate_profiles(
            &export,
            &self.config.engine,
            self.config.eval_hands_per_profile,
            self.config.seed ^ iteration,
        );

        #[allow(clippy::cast_precision_loss)]
        let iters_per_sec = if elapsed_secs > 0.0 {
            iteration as f64 / elapsed_secs
        } else {
            0.0
        };

        let record = CheckpointRecord {
            iteration,
            infosets: self.nodes.len(),
            iters_per_sec,
            table_bytes: self.nodes.approx_bytes(),
            drift,
            eval,
        };
        self.checkpoints.push(record.clone());
        self.prev_export = Some(export);
        record
    }

    /// Plateau: the last three checkpoints all drift at or below the
    /// threshold and their aggregate EVs span at most the EV threshold.
    fn plateaued(&self) -> bool {
        if self.checkpoints.len() < PLATEAU_WINDOW {
            return false;
        }
        let recent = &self.checkpoints[self.checkpoints.len() - PLATEAU_WINDOW..];
        if recent.iter().any(|c| c.drift > self.config.drift_plateau) {
            return false;
        }
        let evs: Vec<f64> = recent.iter().map(|c| c.eval.aggregate).collect();
        let max = evs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = evs.iter().copied().fold(f64::INFINITY, f64::min);
        max - min <= self.config.ev_plateau
    }

    fn export_file(&self, stop_reason: StopReason) -> PolicyFile {
        let engine = &self.config.engine;
        PolicyFile {
            meta: PolicyMeta {
                iterations: self.iterations_done,
                seed: self.config.seed,
                small_blind: engine.small_blind,
                big_blind: engine.big_blind,
                start_stack: engine.start_stack,
                max_raises: engine.max_raises,
                equity_trials: self.trials,
                abstraction_version: ABSTRACTION_VERSION.to_string(),
                stop_reason,
                checkpoints: self.checkpoints.clone(),
            },
            policy: self.nodes.export_policy(),
        }
    }
}
