//! Canonical information-set keys.
//!
//! Keys are strings of the form
//! `<street>|<pos>|tex=<pppp>|spr=<band>|<bet_state>|r=<raises>|hs=<band>`
//! composed from public state plus the hero's hand-strength band. Two
//! structurally equivalent states produce byte-identical keys; the trainer
//! writes them and the runtime looks them up.

use crate::cards::value_rank;
use crate::config::CHIP_EPSILON;
use crate::game::{HandState, Street};
use crate::poker::{Card, Suit};

/// Board texture bits: paired, two-tone, monotone, connected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardTexture {
    pub paired: bool,
    pub two_tone: bool,
    pub monotone: bool,
    pub connected: bool,
}

impl BoardTexture {
    /// Classify a public board. The empty preflop board is all zeros.
    #[must_use]
    pub fn classify(board: &[Card]) -> Self {
        if board.is_empty() {
            return Self::default();
        }

        let mut suit_counts = [0u8; 4];
        for c in board {
            let idx = match c.suit {
                Suit::Spade => 0,
                Suit::Heart => 1,
                Suit::Diamond => 2,
                Suit::Club => 3,
            };
            suit_counts[idx] += 1;
        }
        let max_suit = suit_counts.iter().copied().max().unwrap_or(0);

        let mut ranks: Vec<u8> = board.iter().map(|&c| value_rank(c.value)).collect();
        ranks.sort_unstable();
        let paired = ranks.windows(2).any(|w| w[0] == w[1]);
        ranks.dedup();
        // Adjacent distinct ranks within two of each other; two such pairs
        // make the board connected.
        let close_pairs = ranks.windows(2).filter(|w| w[1] - w[0] <= 2).count();

        Self {
            paired,
            two_tone: max_suit == 2,
            monotone: max_suit >= 3,
            connected: close_pairs >= 2,
        }
    }

    /// The four texture bits as key characters, `<paired><two_tone><monotone><connected>`.
    #[must_use]
    pub fn bits(self) -> [u8; 4] {
        [
            u8::from(self.paired),
            u8::from(self.two_tone),
            u8::from(self.monotone),
            u8::from(self.connected),
        ]
    }

    /// Flush-heavy or coordinated boards where raw equity realizes worst.
    #[must_use]
    pub fn is_wet(self) -> bool {
        self.monotone || (self.two_tone && self.connected)
    }

    /// No pair, no suit pressure, no connectivity.
    #[must_use]
    pub fn is_dry(self) -> bool {
        !self.paired && !self.two_tone && !self.monotone && !self.connected
    }
}

/// SPR band label used in keys.
#[must_use]
pub fn spr_band(spr: f64) -> &'static str {
    if spr < 1.0 {
        "0_1"
    } else if spr < 2.0 {
        "1_2"
    } else if spr < 4.0 {
        "2_4"
    } else if spr < 8.0 {
        "4_8"
    } else {
        "8_plus"
    }
}

/// Hand-strength band 0..9: `floor(clamp(hs) * 10)`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn hs_band(hs: f64) -> u8 {
    (hs.clamp(0.0, 0.999_999) * 10.0) as u8
}

/// Position label: seat 1 is in position heads-up.
#[must_use]
pub fn position_label(seat: usize) -> &'static str {
    if seat == 1 {
        "IP"
    } else {
        "OOP"
    }
}

/// Compose the canonical key for the acting seat of `state`.
///
/// `board` is the public board for the state's street; `hs` the hero's
/// estimated hand strength.
#[must_use]
pub fn key(state: &HandState, board: &[Card], hs: f64) -> String {
    compose(
        state.street,
        state.to_act,
        board,
        state.spr(),
        state.to_call() > CHIP_EPSILON,
        state.raises,
        hs,
    )
}

/// Compose a key from explicit components.
#[must_use]
pub fn compose(
    street: Street,
    seat: usize,
    board: &[Card],
    spr: f64,
    facing_bet: bool,
    raises: u8,
    hs: f64,
) -> String {
    let tex = BoardTexture::classify(board).bits();
    let bet_state = if facing_bet { "facingBet" } else { "unopened" };
    format!(
        "{}|{}|tex={}{}{}{}|spr={}|{}|r={}|hs={}",
        street.name(),
        position_label(seat),
        tex[0],
        tex[1],
        tex[2],
        tex[3],
        spr_band(spr),
        bet_state,
        raises,
        hs_band(hs),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::game::Action;
    use crate::poker::Value;
    use test_macros::timed_test;

    fn card(value: Value, suit: Suit) -> Card {
        Card::new(value, suit)
    }

    #[timed_test]
    fn preflop_board_has_zero_texture() {
        assert_eq!(BoardTexture::classify(&[]).bits(), [0, 0, 0, 0]);
    }

    #[timed_test]
    fn paired_board_detected() {
        let board = [
            card(Value::King, Suit::Spade),
            card(Value::King, Suit::Heart),
            card(Value::Four, Suit::Club),
        ];
        let tex = BoardTexture::classify(&board);
        assert!(tex.paired);
        assert!(!tex.monotone);
    }

    #[timed_test]
    fn monotone_board_detected() {
        let board = [
            card(Value::King, Suit::Heart),
            card(Value::Nine, Suit::Heart),
            card(Value::Four, Suit::Heart),
        ];
        let tex = BoardTexture::classify(&board);
        assert!(tex.monotone);
        assert!(!tex.two_tone);
        assert!(tex.is_wet());
    }

    #[timed_test]
    fn two_tone_board_detected() {
        let board = [
            card(Value::King, Suit::Heart),
            card(Value::Nine, Suit::Heart),
            card(Value::Four, Suit::Club),
        ];
        assert!(BoardTexture::classify(&board).two_tone);
    }

    #[timed_test]
    fn connected_needs_two_close_gaps() {
        let qjt = [
            card(Value::Queen, Suit::Heart),
            card(Value::Jack, Suit::Club),
            card(Value::Ten, Suit::Spade),
        ];
        assert!(BoardTexture::classify(&qjt).connected);

        let k72 = [
            card(Value::King, Suit::Heart),
            card(Value::Seven, Suit::Club),
            card(Value::Two, Suit::Spade),
        ];
        let tex = BoardTexture::classify(&k72);
        assert!(!tex.connected);
        assert!(tex.is_dry() || tex.two_tone);
    }

    #[timed_test]
    fn spr_band_boundaries() {
        assert_eq!(spr_band(0.5), "0_1");
        assert_eq!(spr_band(1.0), "1_2");
        assert_eq!(spr_band(2.0), "2_4");
        assert_eq!(spr_band(3.99), "2_4");
        assert_eq!(spr_band(4.0), "4_8");
        assert_eq!(spr_band(8.0), "8_plus");
        assert_eq!(spr_band(50.0), "8_plus");
    }

    #[timed_test]
    fn hs_band_clamps_and_floors() {
        assert_eq!(hs_band(-0.2), 0);
        assert_eq!(hs_band(0.0), 0);
        assert_eq!(hs_band(0.19), 1);
        assert_eq!(hs_band(0.55), 5);
        assert_eq!(hs_band(0.999), 9);
        assert_eq!(hs_band(1.0), 9);
        assert_eq!(hs_band(2.0), 9);
    }

    #[timed_test]
    fn key_has_expected_shape() {
        let cfg = EngineConfig::default();
        let state = HandState::new(&cfg);
        let k = key(&state, &[], 0.47);
        assert_eq!(k, "preflop|OOP|tex=0000|spr=8_plus|facingBet|r=0|hs=4");
    }

    #[timed_test]
    fn key_is_deterministic_for_equivalent_states() {
        let cfg = EngineConfig::default();
        let mut a = HandState::new(&cfg);
        let mut b = HandState::new(&cfg);
        a.apply(Action::Call);
        a.apply(Action::Check);
        b.apply(Action::Call);
        b.apply(Action::Check);
        let board = [
            card(Value::Queen, Suit::Heart),
            card(Value::Jack, Suit::Heart),
            card(Value::Ten, Suit::Spade),
        ];
        assert_eq!(key(&a, &board, 0.83), key(&b, &board, 0.83));
    }

    #[timed_test]
    fn key_reflects_position_and_bet_state() {
        let cfg = EngineConfig::default();
        let mut state = HandState::new(&cfg);
        state.apply(Action::Call);
        state.apply(Action::Check);
        // Flop, seat 0, unopened.
        let board = [
            card(Value::King, Suit::Spade),
            card(Value::Seven, Suit::Heart),
            card(Value::Two, Suit::Club),
        ];
        let k0 = key(&state, &board, 0.5);
        assert!(k0.starts_with("flop|OOP|"));
        assert!(k0.contains("|unopened|"));

        state.apply(Action::BetHalf);
        let k1 = key(&state, &board, 0.5);
        assert!(k1.starts_with("flop|IP|"));
        assert!(k1.contains("|facingBet|"));
    }
}
