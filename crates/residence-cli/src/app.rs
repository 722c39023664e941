//! Runtime assembly: load policy, catalog and fixtures, answer requests.

use std::path::Path;
use std::sync::Arc;

use residence_core::catalog::MemoryCatalog;
use residence_core::contract::{ErrorResponse, ImputeRequest};
use residence_core::normalize::RuleNormalizer;
use residence_core::policy::{Policy, PolicyHandle};
use residence_core::sources::{FixtureSet, KeywordTextInference};
use residence_core::{FinalDecision, ImputerOptions, ResidenceImputer};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::CliResult;

/// Catalog used when no `--catalog` is given
const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

/// Where the runtime reads its inputs from
#[derive(Debug, Default, Clone, Copy)]
pub struct Sources<'a> {
    pub policy: Option<&'a Path>,
    pub catalog: Option<&'a Path>,
    pub fixtures: Option<&'a Path>,
}

/// Load and validate the policy; built-in defaults when no path is given.
pub fn load_policy(path: Option<&Path>) -> CliResult<Policy> {
    let policy = match path {
        Some(path) => Policy::from_path(path)?,
        None => Policy::default(),
    };
    policy.validate()?;
    Ok(policy)
}

/// Imputer assembled from local JSON inputs
pub struct Runtime {
    imputer: ResidenceImputer,
}

impl Runtime {
    pub fn load(sources: Sources<'_>, options: ImputerOptions) -> CliResult<Self> {
        let policy = PolicyHandle::new(load_policy(sources.policy)?)?;

        let catalog = match sources.catalog {
            Some(path) => MemoryCatalog::from_path(path)?,
            None => MemoryCatalog::from_json(BUILTIN_CATALOG)?,
        };
        info!(
            "Catalog loaded: {} regions, {} comunas",
            catalog.region_count(),
            catalog.comuna_count()
        );

        let fixtures = match sources.fixtures {
            Some(path) => FixtureSet::from_path(path)?,
            None => {
                warn!("No fixtures given, registry and claims sources are empty");
                FixtureSet::default()
            }
        };
        let (registry, claims) = fixtures.into_sources();
        info!(
            "Fixtures loaded: {} registry, {} claims records",
            registry.len(),
            claims.len()
        );

        let text = KeywordTextInference::new(catalog.comuna_vocabulary().to_vec());

        let imputer = ResidenceImputer::builder()
            .registry(Arc::new(registry))
            .claims(Arc::new(claims))
            .text_inference(Arc::new(text))
            .catalog(Arc::new(catalog))
            .normalizer(Arc::new(RuleNormalizer::new()))
            .policy(policy)
            .options(options)
            .build()?;

        Ok(Self { imputer })
    }

    pub fn policy_version(&self) -> String {
        self.imputer.policy().snapshot().version.clone()
    }

    /// Validate and answer one request.
    ///
    /// Requests without an audit id get a fresh UUID so the response can
    /// always be traced.
    pub fn handle(&self, request: &ImputeRequest) -> Result<FinalDecision, ErrorResponse> {
        let audit_id = request
            .audit_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let valid = request.validate().map_err(|e| {
            warn!("Rejected request {}: {}", audit_id, e);
            ErrorResponse::validation(&e, &audit_id)
        })?;

        self.imputer
            .decide(
                &valid.rut,
                &valid.dv,
                valid.vital_status,
                valid.ges_text.as_deref(),
                valid.noges_text.as_deref(),
                &audit_id,
            )
            .map_err(|e| {
                warn!("Request {} failed: {}", audit_id, e);
                ErrorResponse::from_impute(&e, &audit_id)
            })
    }
}
