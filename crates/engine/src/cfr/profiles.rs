//! Fixed rule-based opponents for policy evaluation.
//!
//! Each profile maps (legal actions, to_call, pot, uniform draws) to an
//! action with hard-coded frequencies. They are intentionally simple and
//! stationary so checkpoint EVs are comparable across a run.

use rand::Rng;

use crate::ev::required_equity;
use crate::game::{Action, Actions};

/// Evaluation opponent archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Tight and fold-heavy.
    Nit,
    /// Calls nearly everything.
    Station,
    /// Raise-heavy.
    Aggro,
    /// Continues exactly when the price is right.
    PotOdds,
}

impl Profile {
    pub const ALL: [Self; 4] = [Self::Nit, Self::Station, Self::Aggro, Self::PotOdds];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Nit => "nit",
            Self::Station => "station",
            Self::Aggro => "aggro",
            Self::PotOdds => "pot_odds",
        }
    }

    /// Choose an action at the current node.
    pub fn act<R: Rng>(self, legal: &Actions, to_call: f64, pot: f64, rng: &mut R) -> Action {
        let facing = legal.contains(&Action::Fold);
        let intent = if facing {
            self.facing_bet(to_call, pot, rng)
        } else {
            self.unopened(rng)
        };
        pick(legal, intent)
    }

    fn facing_bet<R: Rng>(self, to_call: f64, pot: f64, rng: &mut R) -> Action {
        let req = required_equity(pot, to_call);
        let draw = rng.gen::<f64>();
        match self {
            Self::Nit => {
                if req > 0.25 {
                    if draw < 0.72 {
                        Action::Fold
                    } else {
                        Action::Call
                    }
                } else if draw < 0.30 {
                    Action::Fold
                } else if draw < 0.95 {
                    Action::Call
                } else {
                    Action::RaiseHalf
                }
            }
            Self::Station => {
                if draw < 0.85 {
                    Action::Call
                } else if draw < 0.92 {
                    Action::Fold
                } else {
                    Action::RaiseHalf
                }
            }
            Self::Aggro => {
                if draw < 0.28 {
                    Action::RaiseHalf
                } else if draw < 0.42 {
                    Action::RaisePot
                } else if draw < 0.78 {
                    Action::Call
                } else {
                    Action::Fold
                }
            }
            Self::PotOdds => {
                if req <= 0.33 {
                    Action::Call
                } else {
                    Action::Fold
                }
            }
        }
    }

    fn unopened<R: Rng>(self, rng: &mut R) -> Action {
        let draw = rng.gen::<f64>();
        match self {
            Self::Nit => {
                if draw < 0.80 {
                    Action::Check
                } else {
                    Action::BetHalf
                }
            }
            Self::Station => {
                if draw < 0.72 {
                    Action::Check
                } else {
                    Action::BetHalf
                }
            }
            Self::Aggro => {
                if draw < 0.38 {
                    Action::Check
                } else if draw < 0.78 {
                    Action::BetHalf
                } else {
                    Action::BetPot
                }
            }
            Self::PotOdds => {
                if draw < 0.5 {
                    Action::Check
                } else {
                    Action::BetHalf
                }
            }
        }
    }
}

/// Map the profile's intended action onto the legal set: the intent if
/// legal, otherwise the matching bet/raise substitute, otherwise the
/// quietest legal action.
fn pick(legal: &Actions, intent: Action) -> Action {
    if legal.contains(&intent) {
        return intent;
    }
    let substitute = match intent {
        Action::BetHalf => Action::RaiseHalf,
        Action::BetPot => Action::RaisePot,
        Action::RaiseHalf => Action::BetHalf,
        Action::RaisePot => Action::BetPot,
        Action::Check => Action::Call,
        Action::Call => Action::Check,
        other => other,
    };
    if legal.contains(&substitute) {
        return substitute;
    }
    legal
        .iter()
        .copied()
        .min_by_key(|a| a.aggression())
        .unwrap_or(Action::Fold)
}
