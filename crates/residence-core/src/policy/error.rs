//! Policy error types

use thiserror::Error;

/// Errors raised while loading or validating a policy
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A weight, bonus or base confidence outside 0.0..=1.0 (or NaN)
    #[error("{name} must be within [0, 1]; got {value}")]
    OutOfRange { name: &'static str, value: f64 },

    /// A time budget that is not a positive integer
    #[error("{name} must be a positive number of milliseconds")]
    NonPositiveBudget { name: &'static str },

    /// Version tag missing
    #[error("policy version must not be empty")]
    MissingVersion,

    /// Malformed policy document
    #[error("invalid policy document: {0}")]
    Parse(#[from] serde_json::Error),

    /// Policy file could not be read
    #[error("failed to read policy file: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for policy operations
pub type PolicyResult<T> = Result<T, PolicyError>;
