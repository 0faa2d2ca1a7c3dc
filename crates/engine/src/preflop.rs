//! Preflop hand tiers and the heuristic action mix.
//!
//! Preflop play does not consult the blueprint: pockets are bucketed into
//! five tiers and each tier carries a raise/call/passive weight triple per
//! context (unopened vs facing a raise). Equity and observed opponent
//! tendencies nudge the triple, raise mass is split across sizes, and the
//! final action samples a softmax blend of EV and log mix weight.

use rand::Rng;

use crate::cards::value_rank;
use crate::game::{Action, Actions, NUM_ACTIONS};
use crate::poker::Card;
use crate::stats::OpponentStats;

/// Weight of EV (vs log mix weight) in the sampling blend.
const BLEND: f64 = 0.55;
/// Softmax temperature for preflop sampling.
const TEMPERATURE: f64 = 0.85;
/// Floor for log-weights of near-zero actions.
const WEIGHT_FLOOR: f64 = 1e-4;

/// Pocket tier, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Premium,
    Strong,
    Medium,
    Speculative,
    Trash,
}

/// Classify a pocket into its tier.
#[must_use]
pub fn classify(hole: [Card; 2]) -> Tier {
    let r0 = value_rank(hole[0].value);
    let r1 = value_rank(hole[1].value);
    let (high, low) = if r0 >= r1 { (r0, r1) } else { (r1, r0) };
    let suited = hole[0].suit == hole[1].suit;
    let gap = high - low;

    if high == low {
        return match high {
            12.. => Tier::Premium, // QQ+
            9.. => Tier::Strong,   // 99+
            6.. => Tier::Medium,   // 66+
            _ => Tier::Speculative,
        };
    }

    if suited && high == 14 && low >= 10 {
        Tier::Premium
    } else if high == 14 && low >= 12 {
        Tier::Strong
    } else if suited && high >= 13 && low >= 10 {
        Tier::Strong
    } else if high >= 13 && low >= 11 {
        Tier::Medium
    } else if suited && gap <= 2 && high >= 9 {
        Tier::Medium
    } else if suited && high == 14 {
        Tier::Medium
    } else if gap <= 1 && high >= 10 {
        Tier::Speculative
    } else if suited && high >= 9 {
        Tier::Speculative
    } else {
        Tier::Trash
    }
}

/// Base (raise, call, passive) mass per tier and context.
fn base_triple(tier: Tier, facing_raise: bool) -> (f64, f64, f64) {
    if facing_raise {
        match tier {
            Tier::Premium => (0.72, 0.24, 0.04),
            Tier::Strong => (0.42, 0.42, 0.16),
            Tier::Medium => (0.16, 0.48, 0.36),
            Tier::Speculative => (0.09, 0.36, 0.55),
            Tier::Trash => (0.03, 0.11, 0.86),
        }
    } else {
        match tier {
            Tier::Premium => (0.85, 0.11, 0.04),
            Tier::Strong => (0.66, 0.24, 0.10),
            Tier::Medium => (0.46, 0.38, 0.16),
            Tier::Speculative => (0.30, 0.44, 0.26),
            Tier::Trash => (0.12, 0.28, 0.60),
        }
    }
}

/// Heuristic mix over the eight actions, normalized over `legal`.
///
/// The tier triple is corrected by equity (±0.08 outside the 0.42..0.62
/// band) and by the opponent's observed 3-bet tendency, then distributed:
/// raise mass across `RaiseHalf`/`RaisePot` (plus a small `AllIn` slice for
/// monsters), call mass to `Call` (or `Check`), passive mass to `Check`
/// (or `Fold`).
#[must_use]
pub fn mix_weights(
    tier: Tier,
    facing_raise: bool,
    hs: f64,
    opp: &OpponentStats,
    legal: &Actions,
) -> [f64; NUM_ACTIONS] {
    let (mut raise, mut call, mut passive) = base_triple(tier, facing_raise);

    // Equity correction.
    if hs > 0.62 {
        let shift = 0.08f64.min(passive);
        raise += shift;
        passive -= shift;
    } else if hs < 0.42 {
        let shift = 0.08f64.min(raise);
        raise -= shift;
        passive += shift;
    }

    // Tendency correction: tighten vs frequent 3-bettors, value-raise more
    // vs passive callers.
    if let Some(threebet) = opp.threebet_rate() {
        let call_rate = opp.call_vs_raise_rate().unwrap_or(0.0);
        if threebet > 0.28 {
            let shift = 0.06f64.min(raise);
            raise -= shift;
            call += shift;
        } else if threebet < 0.10 && call_rate > 0.45 {
            let shift = 0.06f64.min(passive);
            raise += shift;
            passive -= shift;
        }
    }

    let mut weights = [0.0; NUM_ACTIONS];

    // Monsters keep a direct all-in slice.
    let allin_mass = if hs > 0.80 { (raise * 0.15).min(0.10) } else { 0.0 };
    let raise_mass = raise - allin_mass;
    weights[Action::RaiseHalf.index()] = raise_mass * 0.65;
    weights[Action::RaisePot.index()] = raise_mass * 0.35;
    weights[Action::AllIn.index()] = allin_mass;

    if legal.contains(&Action::Call) {
        weights[Action::Call.index()] = call;
    } else {
        weights[Action::Check.index()] += call;
    }
    if legal.contains(&Action::Check) {
        weights[Action::Check.index()] += passive;
    } else {
        weights[Action::Fold.index()] = passive;
    }

    normalize_over_legal(&mut weights, legal);
    weights
}

/// Zero out illegal actions and rescale to sum 1 (uniform fallback).
fn normalize_over_legal(weights: &mut [f64; NUM_ACTIONS], legal: &Actions) {
    for action in Action::ALL {
        if !legal.contains(&action) {
            weights[action.index()] = 0.0;
        }
    }
    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        for w in weights.iter_mut() {
            *w /= total;
        }
    } else {
        #[allow(clippy::cast_precision_loss)]
        let uniform = 1.0 / legal.len() as f64;
        for &action in legal {
            weights[action.index()] = uniform;
        }
    }
}

/// Sample directly from a normalized mix-weight vector.
///
/// Used where the mix is the whole story (trainer preflop fast-forward,
/// policy evaluation); live decisions go through [`blend_sample`].
pub fn sample_mix<R: Rng>(
    legal: &Actions,
    weights: &[f64; NUM_ACTIONS],
    rng: &mut R,
) -> Action {
    let total: f64 = legal.iter().map(|a| weights[a.index()]).sum();
    let mut draw = rng.gen::<f64>() * total.max(f64::MIN_POSITIVE);
    for &action in legal {
        draw -= weights[action.index()];
        if draw <= 0.0 {
            return action;
        }
    }
    legal[legal.len() - 1]
}

/// Sample an action from the softmax blend of EV scores and log mix weights.
pub fn blend_sample<R: Rng>(
    legal: &Actions,
    evs: &[f64; NUM_ACTIONS],
    weights: &[f64; NUM_ACTIONS],
    rng: &mut R,
) -> Action {
    let scores: Vec<f64> = legal
        .iter()
        .map(|a| {
            let i = a.index();
            BLEND * evs[i] + (1.0 - BLEND) * weights[i].max(WEIGHT_FLOOR).ln()
        })
        .collect();

    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| ((s - max) / TEMPERATURE).exp()).collect();
    let total: f64 = exps.iter().sum();

    let mut draw = rng.gen::<f64>() * total;
    for (action, e) in legal.iter().zip(&exps) {
        draw -= e;
        if draw <= 0.0 {
            return *action;
        }
    }
    legal[legal.len() - 1]
}
