//! Closed-form EV scoring and the conservative action guards.
//!
//! Each legal action gets an expected payoff relative to the current state
//! from the hero's estimated hand strength and a modeled opponent response.
//! Around the scorer sit three rule layers: a legality pre-filter that drops
//! dominated actions before scoring, deterministic penalties folded into the
//! scores, and a post-selection conservative override.

use crate::belief::RangeBelief;
use crate::game::{Action, Actions, HandState, NUM_ACTIONS};
use crate::infoset::BoardTexture;
use crate::stats::OpponentStats;

/// EV ties within this margin resolve toward the less aggressive action.
pub const SELECT_TOLERANCE: f64 = 0.05;

/// Weight of observed opponent rates once enough samples exist.
const OBSERVED_WEIGHT: f64 = 0.4;

/// Pot-odds equity required to continue against the current bet.
#[must_use]
pub fn required_equity(pot: f64, to_call: f64) -> f64 {
    if to_call <= 0.0 {
        return 0.0;
    }
    to_call / (pot + to_call)
}

/// Drop dominated actions before scoring.
///
/// Removes FOLD when continuing is clearly priced in, ALL_IN at deep or
/// weak spots, and pot-size aggression without the strength to back it.
/// Returns the filtered set and whether the full set had to be restored
/// because the filter emptied it.
#[must_use]
pub fn prefilter(legal: &Actions, hs: f64, spr: f64, req: f64) -> (Actions, bool) {
    let mut keep = Actions::new();
    for &action in legal {
        let drop = match action {
            Action::Fold => hs > req + 0.02,
            Action::AllIn => (spr > 2.0 && hs < 0.70) || spr > 10.0,
            Action::BetPot | Action::RaisePot => hs < 0.60,
            _ => false,
        };
        if !drop {
            keep.push(action);
        }
    }
    if keep.is_empty() {
        (legal.clone(), true)
    } else {
        (keep, false)
    }
}

/// Equity realization factor for a call on this texture.
fn realize(tex: BoardTexture) -> f64 {
    if tex.is_wet() {
        0.90
    } else if tex.paired {
        0.95
    } else {
        0.93
    }
}

/// Modeled opponent (fold, call, raise) probabilities facing our aggression.
///
/// Base rates come from the equity the sizing offers the opponent, tilted
/// toward observed per-street rates (weight 0.4 once sampled) and by the
/// range belief (strong ranges continue and raise more).
#[must_use]
pub fn opponent_response(
    pay: f64,
    pot: f64,
    state: &HandState,
    belief: &RangeBelief,
    opp: &OpponentStats,
) -> [f64; 3] {
    let opp_req = pay / (pot + 2.0 * pay);
    let sizing = (pay / pot.max(1.0)).min(2.0);

    let mut fold = (0.12 + 0.9 * opp_req + 0.08 * sizing).clamp(0.05, 0.80);
    let mut raise = (0.16 - 0.06 * sizing).clamp(0.04, 0.25);
    let mut call = (1.0 - fold - raise).max(0.05);

    if let Some(observed) = opp.reactions(state.street).and_then(|r| r.rates()) {
        fold = (1.0 - OBSERVED_WEIGHT) * fold + OBSERVED_WEIGHT * observed[0];
        call = (1.0 - OBSERVED_WEIGHT) * call + OBSERVED_WEIGHT * observed[1];
        raise = (1.0 - OBSERVED_WEIGHT) * raise + OBSERVED_WEIGHT * observed[2];
    }

    let tilt = belief.strong_tilt();
    call += 0.18 * tilt;
    raise += 0.10 * tilt;
    fold -= 0.18 * tilt + 0.10 * tilt;

    let mut probs = [fold.max(0.01), call.max(0.01), raise.max(0.01)];
    let total: f64 = probs.iter().sum();
    for p in &mut probs {
        *p /= total;
    }
    probs
}

/// Score every legal action; illegal slots stay at `f64::NEG_INFINITY`.
#[must_use]
pub fn score_actions(
    state: &HandState,
    tex: BoardTexture,
    hs: f64,
    belief: &RangeBelief,
    opp: &OpponentStats,
    legal: &Actions,
) -> [f64; NUM_ACTIONS] {
    let pot = state.pot;
    let to_call = state.to_call();
    let spr = state.spr();
    let marginal = (0.40..=0.65).contains(&hs);

    let mut evs = [f64::NEG_INFINITY; NUM_ACTIONS];
    for &action in legal {
        let mut ev = match action {
            Action::Fold => 0.0,
            Action::Check => hs * pot,
            Action::Call => (hs * pot - (1.0 - hs) * to_call) * realize(tex),
            _ => {
                let pay = state.target_commit(action) - state.commit[state.to_act];
                let response = opponent_response(pay, pot, state, belief, opp);
                let call_branch = hs * (pot + pay) - (1.0 - hs) * pay;
                response[0] * pot
                    + response[1] * call_branch
                    + response[2] * (call_branch - 0.35 * pay)
            }
        };

        // Deterministic penalties.
        let is_raise = matches!(action, Action::RaiseHalf | Action::RaisePot | Action::AllIn);
        if marginal && spr > 2.0 && is_raise {
            ev -= 0.12 * pot;
        }
        if tex.paired && marginal && action.is_aggressive() {
            ev -= 0.10 * pot;
        }
        if tex.is_dry() && matches!(action, Action::BetPot | Action::RaisePot) {
            ev -= 0.08 * pot;
        }
        if action == Action::AllIn && spr > 6.0 {
            ev -= 0.5 * pot;
        }

        evs[action.index()] = ev;
    }
    evs
}

/// Max-EV action with the tolerance tie-break toward less aggression.
#[must_use]
pub fn select(legal: &Actions, evs: &[f64; NUM_ACTIONS]) -> Action {
    debug_assert!(!legal.is_empty());
    let best = legal
        .iter()
        .map(|a| evs[a.index()])
        .fold(f64::NEG_INFINITY, f64::max);
    legal
        .iter()
        .copied()
        .filter(|a| evs[a.index()] >= best - SELECT_TOLERANCE)
        .min_by_key(|a| a.aggression())
        .unwrap_or(legal[0])
}

/// Post-selection conservative override.
///
/// Walks the chosen action down toward calls and checks at spots the EV
/// model is known to overplay: paired boards with marginal strength, deep
/// all-ins, pot-size aggression on dry boards, and thin raises.
#[must_use]
pub fn conservative_override(
    chosen: Action,
    legal: &Actions,
    tex: BoardTexture,
    hs: f64,
    spr: f64,
    req: f64,
) -> Action {
    let passive = passive_fallback(legal);

    if tex.paired && hs > 0.40 && hs < 0.70 && spr > 2.0 && chosen.is_aggressive() {
        return passive;
    }

    let mut chosen = chosen;
    if chosen == Action::AllIn && spr > 1.5 && hs < 0.70 {
        chosen = downgrade(chosen, legal);
    }
    if matches!(chosen, Action::BetPot | Action::RaisePot) && tex.is_dry() && hs < 0.68 {
        chosen = downgrade(chosen, legal);
    }
    if matches!(chosen, Action::RaiseHalf | Action::RaisePot | Action::AllIn)
        && hs < req + 0.18
        && legal.contains(&Action::Call)
    {
        chosen = Action::Call;
    }
    chosen
}

/// Call if legal, otherwise check, otherwise the quietest legal action.
fn passive_fallback(legal: &Actions) -> Action {
    if legal.contains(&Action::Call) {
        Action::Call
    } else if legal.contains(&Action::Check) {
        Action::Check
    } else {
        legal
            .iter()
            .copied()
            .min_by_key(|a| a.aggression())
            .unwrap_or(Action::Fold)
    }
}

/// The next-quietest legal action below `action`, staying aggressive when
/// a smaller sizing exists.
fn downgrade(action: Action, legal: &Actions) -> Action {
    legal
        .iter()
        .copied()
        .filter(|a| a.aggression() < action.aggression() && *a != Action::Fold)
        .max_by_key(|a| a.aggression())
        .unwrap_or_else(|| passive_fallback(legal))
}
