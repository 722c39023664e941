//! Residence imputation use case
//!
//! Sequences the source lookups under one soft time budget, degrades
//! optional sources on failure, runs fusion and maps codes to names.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::evidence::{AddressQuality, Evidence, FinalDecision, InternalDecision, Origin};
use crate::fusion::{decide_alive, decide_deceased, QualityHints};
use crate::policy::{Policy, PolicyHandle};
use crate::ports::{
    AddressNormalizer, AuthoritativeRegistryReader, ClaimsSystemReader, CodeCatalog, ConnectorError,
    ConnectorResult, TextInferenceEngine,
};

use super::deadline::Deadline;
use super::error::{ImputeError, ImputeResult};

/// Vital status of the person whose residence is imputed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VitalStatus {
    Alive,
    Deceased,
}

impl VitalStatus {
    /// Registry status code: 1 alive, 2 deceased
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Alive),
            2 => Some(Self::Deceased),
            _ => None,
        }
    }
}

/// Behavior switches that are not part of the fusion policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImputerOptions {
    /// Skip connector calls once the soft budget is spent instead of issuing
    /// them with a zero deadline. Alive-path sources are treated as absent;
    /// the deceased path fails with a timeout.
    #[serde(default)]
    pub skip_on_exhausted_budget: bool,
}

/// Evidence from an optional source with the quality of its address
type Graded = (Option<Evidence>, Option<AddressQuality>);

/// Coordinates the sources, fusion and catalog for one decision at a time.
///
/// Holds no per-request state; one instance can serve concurrent callers.
pub struct ResidenceImputer {
    registry: Arc<dyn AuthoritativeRegistryReader + Send + Sync>,
    claims: Arc<dyn ClaimsSystemReader + Send + Sync>,
    text: Arc<dyn TextInferenceEngine + Send + Sync>,
    catalog: Arc<dyn CodeCatalog + Send + Sync>,
    normalizer: Option<Arc<dyn AddressNormalizer + Send + Sync>>,
    policy: PolicyHandle,
    options: ImputerOptions,
}

impl ResidenceImputer {
    pub fn builder() -> ResidenceImputerBuilder {
        ResidenceImputerBuilder::default()
    }

    /// Active policy handle (shared with whoever built the imputer)
    pub fn policy(&self) -> &PolicyHandle {
        &self.policy
    }

    /// Impute the residence of one person.
    ///
    /// `audit_id` is opaque and copied into the decision unchanged.
    pub fn decide(
        &self,
        identifier: &str,
        check_digit: &str,
        vital_status: VitalStatus,
        primary_text: Option<&str>,
        secondary_text: Option<&str>,
        audit_id: &str,
    ) -> ImputeResult<FinalDecision> {
        let policy = self.policy.snapshot();
        let deadline = Deadline::start(policy.budgets.global_soft_ms);

        debug!(
            "Deciding {} ({:?}) under policy {}",
            audit_id, vital_status, policy.version
        );

        let core = match vital_status {
            VitalStatus::Deceased => {
                self.decide_deceased_path(identifier, check_digit, &policy, &deadline)
            }
            VitalStatus::Alive => {
                let texts = [primary_text, secondary_text];
                self.decide_alive_path(identifier, check_digit, texts, &policy, &deadline)
            }
        };

        let decision = self.complete(core?, audit_id, &policy)?;
        info!(
            "Decision {}: comuna {} via {} (confidence {:.3}, policy {}, {}ms)",
            decision.audit_id,
            decision.comuna_code,
            decision.rule_path,
            decision.confidence,
            decision.policy_version,
            deadline.elapsed_ms()
        );
        Ok(decision)
    }

    fn decide_deceased_path(
        &self,
        identifier: &str,
        check_digit: &str,
        policy: &Policy,
        deadline: &Deadline,
    ) -> ImputeResult<InternalDecision> {
        let budget_ms = deadline.budget_for(policy.budgets.registry_ms);
        if budget_ms == 0 && self.options.skip_on_exhausted_budget {
            warn!("Budget exhausted before registry lookup");
            let timeout = ConnectorError::Timeout { budget_ms };
            return Err(ImputeError::RegistryFailed(timeout));
        }

        debug!("Registry lookup with {}ms", budget_ms);
        let fetched = self.registry.fetch(identifier, check_digit, budget_ms);
        let mut evidence = fetched.map_err(|e| {
            warn!("Registry lookup failed ({}): {}", e.kind(), e);
            ImputeError::RegistryFailed(e)
        })?;

        // Quality is not used on this path
        self.standardize(&mut evidence).map_err(|e| {
            warn!("Registry address rejected ({}): {}", e.kind(), e);
            ImputeError::Normalization(e)
        })?;

        Ok(decide_deceased(Some(&evidence), policy)?)
    }

    fn decide_alive_path(
        &self,
        identifier: &str,
        check_digit: &str,
        texts: [Option<&str>; 2],
        policy: &Policy,
        deadline: &Deadline,
    ) -> ImputeResult<InternalDecision> {
        let budget = deadline.budget_for(policy.budgets.claims_ms);
        let fetch = |ms| self.claims.fetch(identifier, check_digit, ms);
        let (claims, claims_hint) = self.optional_lookup(Origin::ClaimsSystem, budget, fetch);

        let texts: Vec<String> = texts
            .into_iter()
            .flatten()
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        let (text, text_hint) = if texts.is_empty() {
            debug!("No free text, skipping text inference");
            (None, None)
        } else {
            let budget = deadline.budget_for(policy.budgets.text_inference_ms);
            let infer = |ms| self.text.infer(&texts, ms);
            self.optional_lookup(Origin::TextInference, budget, infer)
        };

        let hints = QualityHints {
            claims: claims_hint,
            text: text_hint,
        };
        Ok(decide_alive(text.as_ref(), claims.as_ref(), hints, policy)?)
    }

    /// Run an optional-source lookup and standardize its address.
    ///
    /// A failed lookup and a failed normalization both leave the source
    /// without evidence.
    fn optional_lookup<F>(&self, origin: Origin, budget_ms: u64, call: F) -> Graded
    where
        F: FnOnce(u64) -> ConnectorResult<Evidence>,
    {
        if budget_ms == 0 && self.options.skip_on_exhausted_budget {
            warn!("Budget exhausted, skipping {} lookup", origin);
            return (None, None);
        }

        debug!("{} lookup with {}ms", origin, budget_ms);
        let graded = call(budget_ms).and_then(|mut evidence| {
            let quality = self.standardize(&mut evidence)?;
            Ok((evidence, quality))
        });

        match graded {
            Ok((evidence, quality)) => (Some(evidence), quality),
            Err(e) => {
                warn!("Dropping {} evidence ({}): {}", origin, e.kind(), e);
                (None, None)
            }
        }
    }

    /// Standardize the evidence address in place and return its quality.
    ///
    /// `None` when there is no normalizer or no address to standardize.
    fn standardize(&self, evidence: &mut Evidence) -> ConnectorResult<Option<AddressQuality>> {
        let Some(normalizer) = self.normalizer.as_ref() else {
            return Ok(None);
        };
        let Some(raw) = evidence.address_text() else {
            return Ok(None);
        };

        let (standardized, quality) = normalizer.normalize(raw)?;
        evidence.address = Some(standardized);
        Ok(Some(quality))
    }

    /// Map codes to names and assemble the external decision.
    fn complete(
        &self,
        core: InternalDecision,
        audit_id: &str,
        policy: &Policy,
    ) -> ImputeResult<FinalDecision> {
        let region_code = self.catalog.to_region_code(&core.comuna_code)?;
        let comuna = self.catalog.to_comuna_name(&core.comuna_code)?;
        let region = self.catalog.to_region_name(&region_code)?;

        Ok(FinalDecision {
            region,
            region_code,
            comuna,
            comuna_code: core.comuna_code,
            address: core.address,
            confidence: core.confidence,
            sources: core.sources,
            audit_id: audit_id.to_string(),
            rule_path: core.rule_path,
            policy_version: policy.version.clone(),
        })
    }
}

/// Builder for [`ResidenceImputer`]
#[derive(Default)]
pub struct ResidenceImputerBuilder {
    registry: Option<Arc<dyn AuthoritativeRegistryReader + Send + Sync>>,
    claims: Option<Arc<dyn ClaimsSystemReader + Send + Sync>>,
    text: Option<Arc<dyn TextInferenceEngine + Send + Sync>>,
    catalog: Option<Arc<dyn CodeCatalog + Send + Sync>>,
    normalizer: Option<Arc<dyn AddressNormalizer + Send + Sync>>,
    policy: Option<PolicyHandle>,
    options: ImputerOptions,
}

impl ResidenceImputerBuilder {
    pub fn registry(
        mut self,
        registry: Arc<dyn AuthoritativeRegistryReader + Send + Sync>,
    ) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn claims(mut self, claims: Arc<dyn ClaimsSystemReader + Send + Sync>) -> Self {
        self.claims = Some(claims);
        self
    }

    pub fn text_inference(mut self, text: Arc<dyn TextInferenceEngine + Send + Sync>) -> Self {
        self.text = Some(text);
        self
    }

    pub fn catalog(mut self, catalog: Arc<dyn CodeCatalog + Send + Sync>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn normalizer(mut self, normalizer: Arc<dyn AddressNormalizer + Send + Sync>) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    /// Policy handle; defaults to the built-in policy
    pub fn policy(mut self, policy: PolicyHandle) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn options(mut self, options: ImputerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> ImputeResult<ResidenceImputer> {
        let missing = ImputeError::MissingCollaborator;
        Ok(ResidenceImputer {
            registry: self.registry.ok_or(missing("registry reader"))?,
            claims: self.claims.ok_or(missing("claims reader"))?,
            text: self.text.ok_or(missing("text inference engine"))?,
            catalog: self.catalog.ok_or(missing("code catalog"))?,
            normalizer: self.normalizer,
            policy: self.policy.unwrap_or_default(),
            options: self.options,
        })
    }
}
