//! The betting state machine: blinds, legal actions, transitions, settlement.
//!
//! `HandState` holds only betting state; cards live in
//! [`HandContext`](crate::cards::HandContext) and streets reveal prefixes of
//! its pre-dealt board. All chip amounts are `f64` chip units.

use crate::cards::{hand_rank, HandContext};
use crate::config::{EngineConfig, CHIP_EPSILON};

use super::{other, Action, Actions, Seat, Street};

/// Outcome of applying one action.
///
/// `clamped` is set when an infeasible target had to be cut to the feasible
/// boundary; the session layer counts these as `illegal_state_warnings`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyReport {
    pub clamped: bool,
    /// Chips the actor moved into the pot.
    pub paid: f64,
}

/// Result of settling a terminal hand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settlement {
    /// Winning seat, or `None` on a chopped showdown.
    pub winner: Option<Seat>,
    /// `final_stack - start_stack` per seat.
    pub payoffs: [f64; 2],
}

/// Betting state of one live hand.
#[derive(Debug, Clone)]
pub struct HandState {
    pub street: Street,
    pub pot: f64,
    /// Largest total committed by either seat this street.
    pub current_bet: f64,
    /// Chips each seat has committed this street.
    pub commit: [f64; 2],
    pub stack: [f64; 2],
    /// Raises this street, capped at the configured maximum.
    pub raises: u8,
    /// Has each seat acted since the last raise.
    pub acted: [bool; 2],
    pub to_act: Seat,
    pub history: Vec<(Street, Action)>,
    pub terminal: bool,
    /// Set when the hand ended by a fold; `None` means showdown pending.
    pub winner: Option<Seat>,
    big_blind: f64,
    max_raises: u8,
}

impl HandState {
    /// Start a hand: seat 0 posts the small blind, seat 1 the big blind,
    /// seat 0 acts first preflop.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        let sb = config.small_blind.min(config.start_stack);
        let bb = config.big_blind.min(config.start_stack);
        Self {
            street: Street::Preflop,
            pot: sb + bb,
            current_bet: bb,
            commit: [sb, bb],
            stack: [config.start_stack - sb, config.start_stack - bb],
            raises: 0,
            acted: [false, false],
            to_act: 0,
            history: Vec::new(),
            terminal: false,
            winner: None,
            big_blind: bb,
            max_raises: config.max_raises,
        }
    }

    /// Chips the acting seat must add to match the current bet.
    #[must_use]
    pub fn to_call(&self) -> f64 {
        (self.current_bet - self.commit[self.to_act]).max(0.0)
    }

    /// Stack-to-pot ratio for the acting seat.
    #[must_use]
    pub fn spr(&self) -> f64 {
        self.stack[self.to_act] / self.pot.max(1.0)
    }

    /// Legal actions for the acting seat, in wire order.
    ///
    /// Empty once the hand is terminal.
    #[must_use]
    pub fn legal_actions(&self) -> Actions {
        let mut out = Actions::new();
        if self.terminal {
            return out;
        }
        let to_call = self.to_call();
        let stack = self.stack[self.to_act];
        if to_call <= CHIP_EPSILON {
            out.push(Action::Check);
            if stack > CHIP_EPSILON {
                if self.street == Street::Preflop {
                    out.push(Action::RaiseHalf);
                    out.push(Action::RaisePot);
                } else {
                    out.push(Action::BetHalf);
                    out.push(Action::BetPot);
                }
                out.push(Action::AllIn);
            }
        } else {
            out.push(Action::Fold);
            out.push(Action::Call);
            if stack > to_call {
                if self.raises < self.max_raises {
                    out.push(Action::RaiseHalf);
                    out.push(Action::RaisePot);
                }
                out.push(Action::AllIn);
            }
        }
        out
    }

    /// Total the acting seat must have committed after taking `action`.
    #[must_use]
    pub fn target_commit(&self, action: Action) -> f64 {
        let seat = self.to_act;
        let commit = self.commit[seat];
        let stack = self.stack[seat];
        let to_call = self.to_call();
        match action {
            Action::Fold | Action::Check => commit,
            Action::Call => commit + stack.min(to_call),
            Action::BetHalf => commit + stack.min((self.pot * 0.5).max(1.0)),
            Action::BetPot => commit + stack.min(self.pot.max(1.0)),
            Action::RaiseHalf => self.raise_target(2.0, 0.5, to_call, stack),
            Action::RaisePot => self.raise_target(3.0, 1.0, to_call, stack),
            Action::AllIn => commit + stack,
        }
    }

    /// Raise target: preflop scales off the blind, postflop off the pot.
    fn raise_target(&self, blind_mult: f64, pot_frac: f64, to_call: f64, stack: f64) -> f64 {
        let increment = if self.street == Street::Preflop {
            (to_call * blind_mult).max(self.big_blind * blind_mult)
        } else {
            to_call.max((self.pot * pot_frac).max(1.0))
        };
        self.current_bet + stack.min(increment)
    }

    /// Apply one action for the acting seat.
    ///
    /// A `Call` with nothing to call is recorded and handled as a `Check`.
    /// Infeasible chip movements are clamped to the feasible boundary and
    /// flagged in the returned report. History grows by exactly one entry.
    pub fn apply(&mut self, action: Action) -> ApplyReport {
        let mut report = ApplyReport::default();
        if self.terminal {
            report.clamped = true;
            return report;
        }

        let seat = self.to_act;
        let action = if action == Action::Call && self.to_call() <= CHIP_EPSILON {
            Action::Check
        } else {
            action
        };
        self.history.push((self.street, action));

        match action {
            Action::Fold => {
                self.terminal = true;
                self.winner = Some(other(seat));
                return report;
            }
            Action::Check => {
                self.acted[seat] = true;
                self.to_act = other(seat);
            }
            _ => {
                let target = self.target_commit(action);
                let mut pay = target - self.commit[seat];
                if pay < 0.0 || pay > self.stack[seat] + CHIP_EPSILON {
                    report.clamped = true;
                    pay = pay.clamp(0.0, self.stack[seat]);
                }
                let pay = pay.min(self.stack[seat]);
                self.stack[seat] -= pay;
                self.commit[seat] += pay;
                self.pot += pay;
                report.paid = pay;

                if self.commit[seat] > self.current_bet + CHIP_EPSILON {
                    // A bet or raise: betting reopens for the opponent.
                    self.current_bet = self.commit[seat];
                    self.raises = (self.raises + 1).min(self.max_raises);
                    self.acted = [false, false];
                }
                self.acted[seat] = true;
                self.to_act = other(seat);
            }
        }

        self.resolve_street_end();
        report
    }

    /// Advance or terminate once betting closes on the current street.
    fn resolve_street_end(&mut self) {
        let matched = (self.commit[0] - self.commit[1]).abs() <= CHIP_EPSILON;
        let both_acted = self.acted[0] && self.acted[1];
        let someone_all_in = self.stack[0] <= CHIP_EPSILON || self.stack[1] <= CHIP_EPSILON;
        // A seat that cannot act (all-in) closes betting once nothing is owed.
        let owes_nothing = self.to_call() <= CHIP_EPSILON;

        if both_acted && matched {
            if someone_all_in || self.street == Street::River {
                self.terminal = true;
            } else {
                self.advance_street();
            }
        } else if someone_all_in && owes_nothing && (self.acted[0] || self.acted[1]) {
            // Short all-in left commits unequal; no further betting is possible.
            self.terminal = true;
        }
    }

    /// Move to the next street and reset per-street betting state.
    fn advance_street(&mut self) {
        if let Some(next) = self.street.next() {
            self.street = next;
            self.current_bet = 0.0;
            self.commit = [0.0, 0.0];
            self.raises = 0;
            self.acted = [false, false];
            self.to_act = 0;
        }
    }

    /// True once the hand has reached a terminal node.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Settle a terminal hand. Pure; calling it twice gives the same result.
    ///
    /// Fold hands award the pot to the non-folder. Showdowns evaluate both
    /// seven-card hands on the full board; equal ranks chop the pot.
    #[must_use]
    pub fn settle(&self, ctx: &HandContext, config: &EngineConfig) -> Settlement {
        let mut final_stacks = self.stack;
        let winner = if let Some(w) = self.winner {
            final_stacks[w] += self.pot;
            Some(w)
        } else {
            let r0 = hand_rank(ctx.holes[0], &ctx.board);
            let r1 = hand_rank(ctx.holes[1], &ctx.board);
            match r0.cmp(&r1) {
                std::cmp::Ordering::Greater => {
                    final_stacks[0] += self.pot;
                    Some(0)
                }
                std::cmp::Ordering::Less => {
                    final_stacks[1] += self.pot;
                    Some(1)
                }
                std::cmp::Ordering::Equal => {
                    final_stacks[0] += self.pot / 2.0;
                    final_stacks[1] += self.pot / 2.0;
                    None
                }
            }
        };
        Settlement {
            winner,
            payoffs: [
                final_stacks[0] - config.start_stack,
                final_stacks[1] - config.start_stack,
            ],
        }
    }
}
