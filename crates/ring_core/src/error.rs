use std::fmt;

/// Errors surfaced by the ring's own API.
///
/// The ring never retries and never logs on its own behalf; every failure
/// here is handed straight back to the caller as a return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingError {
    /// No free slot in the submission queue.
    NoSqe,
    /// `should_stop` was observed; the ring is mid-`destroy`.
    OwnerDead,
}

impl fmt::Display for RingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RingError::NoSqe => write!(f, "no free submission queue entry"),
            RingError::OwnerDead => write!(f, "ring is shutting down"),
        }
    }
}

impl std::error::Error for RingError {}

pub type Result<T> = std::result::Result<T, RingError>;
