//! Collaborator error types

use thiserror::Error;

/// Errors a source connector or the normalizer may return
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectorError {
    /// No record for the requested person
    #[error("not found: {0}")]
    NotFound(String),

    /// Record exists but is invalid, inconsistent or unparseable
    #[error("data quality: {0}")]
    DataQuality(String),

    /// Authentication or authorization against the source failed
    #[error("auth error: {0}")]
    Auth(String),

    /// The call did not finish within its deadline
    #[error("timed out after {budget_ms}ms")]
    Timeout { budget_ms: u64 },
}

impl ConnectorError {
    /// Stable label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::DataQuality(_) => "data_quality",
            Self::Auth(_) => "auth",
            Self::Timeout { .. } => "timeout",
        }
    }
}

/// Result type for connector calls
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Errors raised by the code catalog
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("unknown comuna code: {0}")]
    UnknownComuna(String),

    #[error("unknown region code: {0}")]
    UnknownRegion(String),

    /// Catalog document is inconsistent (duplicate code, dangling region)
    #[error("invalid catalog data: {0}")]
    InvalidData(String),
}

/// Result type for catalog lookups
pub type CatalogResult<T> = Result<T, CatalogError>;
