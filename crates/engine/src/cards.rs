//! Deck construction, dealing, and card-level helpers.
//!
//! A hand's cards are drawn upfront into a [`HandContext`]: both hole pairs
//! and the full five-card board. Streets reveal prefixes of that board, so
//! re-slicing after a board invariant violation is always possible.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::game::Street;
use crate::poker::{Card, Hand, Rank, Rankable, Suit, Value};

pub const SUITS: [Suit; 4] = [Suit::Spade, Suit::Heart, Suit::Diamond, Suit::Club];

pub const VALUES: [Value; 13] = [
    Value::Two,
    Value::Three,
    Value::Four,
    Value::Five,
    Value::Six,
    Value::Seven,
    Value::Eight,
    Value::Nine,
    Value::Ten,
    Value::Jack,
    Value::Queen,
    Value::King,
    Value::Ace,
];

/// Convert a `Value` to a numeric rank (Two=2, ..., Ace=14).
#[must_use]
pub fn value_rank(v: Value) -> u8 {
    u8::from(v) + 2
}

fn suit_ordinal(s: Suit) -> u8 {
    match s {
        Suit::Spade => 0,
        Suit::Heart => 1,
        Suit::Diamond => 2,
        Suit::Club => 3,
    }
}

/// Canonical 0..51 card code: `rank_ordinal * 4 + suit_ordinal`.
#[must_use]
pub fn card_code(c: Card) -> u8 {
    u8::from(c.value) * 4 + suit_ordinal(c.suit)
}

/// Inverse of [`card_code`]. Codes outside 0..51 wrap, so callers pass
/// values produced by `card_code` only.
#[must_use]
pub fn card_from_code(code: u8) -> Card {
    let value = VALUES[usize::from(code / 4) % 13];
    let suit = SUITS[usize::from(code % 4)];
    Card::new(value, suit)
}

/// A fresh 52-card deck in canonical order.
#[must_use]
pub fn standard_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(52);
    for &value in &VALUES {
        for &suit in &SUITS {
            deck.push(Card::new(value, suit));
        }
    }
    deck
}

/// Two-character card label, e.g. `"As"`, `"Td"`.
#[must_use]
pub fn card_label(c: Card) -> String {
    let value = match c.value {
        Value::Two => '2',
        Value::Three => '3',
        Value::Four => '4',
        Value::Five => '5',
        Value::Six => '6',
        Value::Seven => '7',
        Value::Eight => '8',
        Value::Nine => '9',
        Value::Ten => 'T',
        Value::Jack => 'J',
        Value::Queen => 'Q',
        Value::King => 'K',
        Value::Ace => 'A',
    };
    let suit = match c.suit {
        Suit::Spade => 's',
        Suit::Heart => 'h',
        Suit::Diamond => 'd',
        Suit::Club => 'c',
    };
    format!("{value}{suit}")
}

/// Evaluate the best 5-card hand from a 2-card holding plus board cards.
#[must_use]
pub fn hand_rank(holding: [Card; 2], board: &[Card]) -> Rank {
    let mut h = Hand::default();
    for &c in board {
        h.insert(c);
    }
    for c in holding {
        h.insert(c);
    }
    h.rank()
}

/// The cards of one hand, drawn upfront and immutable once dealt.
///
/// `holes[seat]` are the two hole cards for that seat; `board` is the full
/// five-card runout of which each street exposes a prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandContext {
    pub holes: [[Card; 2]; 2],
    pub board: [Card; 5],
}

impl HandContext {
    /// Deal a fresh hand: shuffle, two hole cards per seat, five board cards.
    pub fn deal<R: Rng>(rng: &mut R) -> Self {
        let mut deck = standard_deck();
        deck.shuffle(rng);
        let holes = [[deck[0], deck[1]], [deck[2], deck[3]]];
        let board = [deck[4], deck[5], deck[6], deck[7], deck[8]];
        Self { holes, board }
    }

    /// The public board prefix for a street (0/3/4/5 cards).
    #[must_use]
    pub fn board_for(&self, street: Street) -> &[Card] {
        &self.board[..street.board_len()]
    }
}
