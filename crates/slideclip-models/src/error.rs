//! Error types for model construction and state transitions.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised when a value would violate a model invariant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Invalid duration: {0}s (must be finite and greater than zero)")]
    InvalidDuration(f64),

    #[error("Malformed interval: {0}")]
    MalformedInterval(String),

    #[error("Invalid trim: lead {lead:.3}s + tail {tail:.3}s against duration {duration:.3}s")]
    InvalidTrim { lead: f64, tail: f64, duration: f64 },

    #[error("Trim pass {0} already recorded for this clip")]
    PassAlreadyRecorded(u8),

    #[error("Clip stage cannot move backward from {from} to {to}")]
    StageRegression { from: String, to: String },

    #[error("Duplicate section index {0} in manifest")]
    DuplicateSection(u32),
}

impl ModelError {
    /// Create a malformed interval error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInterval(message.into())
    }
}
