//! Error types for session registry operations.

/// Error type for session registry operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The secure random source could not supply bytes for a token.
    #[error("Entropy source failed: {0}")]
    Entropy(String),

    /// The registry is full and no expired session could be reclaimed.
    #[error("No space left for new session (capacity {capacity})")]
    CapacityExceeded { capacity: usize },

    /// The registry configuration was rejected at construction.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Whether this error reports a full registry.
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self, Error::CapacityExceeded { .. })
    }
}

/// Result type for session registry operations.
pub type Result<T> = std::result::Result<T, Error>;
