//! Pool error types.

use thiserror::Error;

/// Result type for pool operations.
pub type Result<T> = std::result::Result<T, PoolError>;

/// Pool errors.
///
/// Contract violations (reference count overflow, releasing more handles than
/// were acquired) are not represented here: they panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// Invalid configuration or address.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The connection factory failed.
    #[error("Dial error: {0}")]
    Dial(String),

    /// The pool has been closed.
    #[error("pool is closed")]
    Closed,
}

impl PoolError {
    /// Check if this error means the pool is closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Check if this error came from configuration validation.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Create a dial error from any displayable cause.
    pub fn dial(cause: impl std::fmt::Display) -> Self {
        Self::Dial(cause.to_string())
    }
}
