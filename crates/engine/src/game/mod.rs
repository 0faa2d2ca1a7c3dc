//! Action abstraction and the betting state machine.

mod state;

use std::fmt;

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

pub use state::{ApplyReport, HandState, Settlement};

/// Number of actions in the abstraction; probability vectors are this long.
pub const NUM_ACTIONS: usize = 8;

/// Stack-allocated legal-action list.
pub type Actions = ArrayVec<Action, NUM_ACTIONS>;

/// Seat index in a heads-up hand: 0 (small blind) or 1 (big blind).
pub type Seat = usize;

/// The seat opposite `seat`.
#[must_use]
pub const fn other(seat: Seat) -> Seat {
    1 - seat
}

/// The fixed action abstraction, in wire order.
///
/// Bet fractions are of the current pot; raises are to a target total over
/// the current bet. Preflop nodes emit `Raise*` instead of `Bet*` since the
/// big blind is already posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Fold,
    Check,
    Call,
    BetHalf,
    BetPot,
    RaiseHalf,
    RaisePot,
    AllIn,
}

impl Action {
    /// All actions in wire order (index == position).
    pub const ALL: [Self; NUM_ACTIONS] = [
        Self::Fold,
        Self::Check,
        Self::Call,
        Self::BetHalf,
        Self::BetPot,
        Self::RaiseHalf,
        Self::RaisePot,
        Self::AllIn,
    ];

    /// Wire index of this action (0..8).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`Action::index`].
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// True for bets, raises, and all-in.
    #[must_use]
    pub const fn is_aggressive(self) -> bool {
        matches!(
            self,
            Self::BetHalf | Self::BetPot | Self::RaiseHalf | Self::RaisePot | Self::AllIn
        )
    }

    /// Aggression rank used for tie-breaking toward the quieter action.
    ///
    /// Fold < Check < Call < `BetHalf` < `RaiseHalf` < `BetPot` < `RaisePot` < `AllIn`.
    #[must_use]
    pub const fn aggression(self) -> u8 {
        match self {
            Self::Fold => 0,
            Self::Check => 1,
            Self::Call => 2,
            Self::BetHalf => 3,
            Self::RaiseHalf => 4,
            Self::BetPot => 5,
            Self::RaisePot => 6,
            Self::AllIn => 7,
        }
    }

    /// Short symbol used in hand histories.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Fold => "f",
            Self::Check => "x",
            Self::Call => "c",
            Self::BetHalf => "b50",
            Self::BetPot => "b100",
            Self::RaiseHalf => "r50",
            Self::RaisePot => "r100",
            Self::AllIn => "ai",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Fold => "Fold",
            Self::Check => "Check",
            Self::Call => "Call",
            Self::BetHalf => "Bet Half Pot",
            Self::BetPot => "Bet Pot",
            Self::RaiseHalf => "Raise Half Pot",
            Self::RaisePot => "Raise Pot",
            Self::AllIn => "All-In",
        };
        write!(f, "{s}")
    }
}

/// Betting street.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Street {
    Preflop,
    Flop,
    Turn,
    River,
}

impl Street {
    pub const ALL: [Self; 4] = [Self::Preflop, Self::Flop, Self::Turn, Self::River];

    /// Street index 0..3.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Number of public board cards on this street.
    #[must_use]
    pub const fn board_len(self) -> usize {
        match self {
            Self::Preflop => 0,
            Self::Flop => 3,
            Self::Turn => 4,
            Self::River => 5,
        }
    }

    /// The following street, or `None` on the river.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Preflop => Some(Self::Flop),
            Self::Flop => Some(Self::Turn),
            Self::Turn => Some(Self::River),
            Self::River => None,
        }
    }

    /// Lowercase name, as used in infoset keys.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Preflop => "preflop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
        }
    }
}

impl fmt::Display for Street {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
