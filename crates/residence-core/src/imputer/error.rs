//! Imputation error types

use thiserror::Error;

use crate::fusion::FusionError;
use crate::ports::{CatalogError, ConnectorError};

/// Errors surfaced by [`ResidenceImputer::decide`](super::ResidenceImputer::decide)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImputeError {
    /// No fusion branch could produce a comuna
    #[error(transparent)]
    Fusion(#[from] FusionError),

    /// Registry lookup failed; the deceased path has no fallback source
    #[error("registry lookup failed on deceased path: {0}")]
    RegistryFailed(#[source] ConnectorError),

    /// Registry address could not be standardized; the deceased path has no
    /// other address to fall back on
    #[error("address normalization failed on deceased path: {0}")]
    Normalization(#[source] ConnectorError),

    /// Comuna or region code missing from the catalog
    #[error("catalog lookup failed: {0}")]
    Catalog(#[from] CatalogError),

    /// Builder was missing a required collaborator
    #[error("imputer is missing its {0}")]
    MissingCollaborator(&'static str),
}

impl ImputeError {
    /// Whether this is a domain failure: no determinable residence
    pub fn is_insufficient_evidence(&self) -> bool {
        matches!(self, Self::Fusion(_) | Self::RegistryFailed(_))
    }
}

/// Result type for imputation
pub type ImputeResult<T> = Result<T, ImputeError>;
