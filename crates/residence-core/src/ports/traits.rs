//! Collaborator trait definitions
//!
//! The orchestrator depends only on these traits. Implementations may be
//! network clients, database readers, or the in-memory versions shipped in
//! this crate for tests and local runs.

use crate::evidence::{AddressQuality, Evidence};

use super::error::{CatalogResult, ConnectorResult};

/// Reader for the official registry (deceased persons).
///
/// Must honor `deadline_ms` and fail with `ConnectorError::Timeout` on
/// overrun. Returned evidence has origin `AuthoritativeRegistry`.
pub trait AuthoritativeRegistryReader {
    fn fetch(
        &self,
        identifier: &str,
        check_digit: &str,
        deadline_ms: u64,
    ) -> ConnectorResult<Evidence>;
}

/// Reader for the claims system.
///
/// Same contract as the registry reader; returned evidence has origin
/// `ClaimsSystem` and may carry neither comuna nor address.
pub trait ClaimsSystemReader {
    fn fetch(
        &self,
        identifier: &str,
        check_digit: &str,
        deadline_ms: u64,
    ) -> ConnectorResult<Evidence>;
}

/// Infers a comuna and address from clinical free text.
///
/// Returned evidence has origin `TextInference` and may carry a model
/// probability and version. Never fails with `ConnectorError::Auth`.
pub trait TextInferenceEngine {
    fn infer(&self, texts: &[String], deadline_ms: u64) -> ConnectorResult<Evidence>;
}

/// Standardizes addresses and grades their quality. No deadline; should
/// only fail on extreme malformation.
pub trait AddressNormalizer {
    fn normalize(&self, raw: &str) -> ConnectorResult<(String, AddressQuality)>;
}

/// In-memory code/name catalog for comunas and regions.
///
/// Lookups are deterministic and must not perform per-call I/O.
pub trait CodeCatalog {
    /// Region code a comuna belongs to
    fn to_region_code(&self, comuna_code: &str) -> CatalogResult<String>;

    /// Display name of a comuna
    fn to_comuna_name(&self, comuna_code: &str) -> CatalogResult<String>;

    /// Display name of a region
    fn to_region_name(&self, region_code: &str) -> CatalogResult<String>;

    /// Resolve a comuna name (any case or accents) to its code.
    ///
    /// Returns `None` when nothing matches.
    fn to_comuna_code(&self, name_like: &str) -> Option<String>;
}
