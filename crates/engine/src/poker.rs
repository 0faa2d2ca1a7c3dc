//! Re-exports of the `rs_poker` card types used throughout the engine.
//!
//! Everything card-shaped goes through this module so the rest of the
//! crate never names `rs_poker` directly.

pub use rs_poker::core::{Card, Hand, Rank, Rankable, Suit, Value};
