use thiserror::Error;

/// Protocol-facing errors: invalid input from the caller.
///
/// Everything else the engine hits at runtime (clamped transitions,
/// re-sliced boards, emptied legal sets) recovers locally and is surfaced
/// through [`diag`](crate::session::Engine::diag) counters instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("bad action index {index} (legal actions: {legal})")]
    InvalidAction { index: usize, legal: usize },

    #[error("unknown session {0}")]
    UnknownSession(u64),
}

/// Errors loading or saving strategy files.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("strategy serialization error: {0}")]
    Serialization(String),
}
