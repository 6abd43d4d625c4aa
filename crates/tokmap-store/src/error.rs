//! Error types for binding store operations.

use thiserror::Error;
use tokmap_types::TypeError;

/// Errors that can occur while issuing or resolving tokens.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The kind or slug failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] TypeError),

    /// No fresh token could be minted within the attempt budget.
    #[error("token space exhausted after {attempts} attempts")]
    TokenSpaceExhausted { attempts: u32 },

    /// A thread panicked while holding the index lock.
    #[error("index lock poisoned")]
    LockPoisoned,

    /// The journal contains a line that cannot be applied.
    #[error("corrupt journal at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error during journal operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether the failure was caused by the caller's input rather than the
    /// service itself.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

/// Convenience type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
