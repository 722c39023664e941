//! Fusion error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decision branch a fusion call was asked to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionPath {
    Deceased,
    Alive,
}

impl std::fmt::Display for DecisionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deceased => write!(f, "deceased"),
            Self::Alive => write!(f, "alive"),
        }
    }
}

/// Errors produced by the fusion rules
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FusionError {
    /// No branch can produce a comuna code
    #[error("insufficient evidence for {path} path: {detail}")]
    InsufficientEvidence {
        path: DecisionPath,
        detail: &'static str,
    },
}

/// Result type for fusion operations
pub type FusionResult<T> = Result<T, FusionError>;
