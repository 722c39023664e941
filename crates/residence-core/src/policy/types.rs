//! Policy parameters consumed by the fusion rules and the orchestrator

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{PolicyError, PolicyResult};

/// Version tag of the built-in defaults
pub const DEFAULT_POLICY_VERSION: &str = "2025-08-20-b-lite-1";

/// Weights, bonuses and base confidences used by fusion.
/// All values are expected within 0.0..=1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionWeights {
    /// Weight applied to the text-inference model probability
    pub w_nlp: f64,
    /// Fixed boost when text inference and claims agree on the comuna
    pub boost_agree: f64,
    /// Address bonus factor when the address comes from the claims system
    pub addr_bonus_claims: f64,
    /// Address bonus factor when the address comes from text inference
    pub addr_bonus_nlp: f64,
    /// Model probability assumed when text inference reports none
    pub nlp_p_default: f64,
    /// Base confidence for the deceased path
    pub dco_base_conf: f64,
    /// Multiplicative penalty when the registry has no address
    pub dco_no_address_penalty: f64,
    /// Base confidence when only the claims system has a comuna
    pub claims_only_base: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            w_nlp: 0.90,
            boost_agree: 0.15,
            addr_bonus_claims: 0.05,
            addr_bonus_nlp: 0.03,
            nlp_p_default: 0.70,
            dco_base_conf: 0.98,
            dco_no_address_penalty: 0.92,
            claims_only_base: 0.65,
        }
    }
}

impl FusionWeights {
    fn named(&self) -> [(&'static str, f64); 8] {
        [
            ("w_nlp", self.w_nlp),
            ("boost_agree", self.boost_agree),
            ("addr_bonus_claims", self.addr_bonus_claims),
            ("addr_bonus_nlp", self.addr_bonus_nlp),
            ("nlp_p_default", self.nlp_p_default),
            ("dco_base_conf", self.dco_base_conf),
            ("dco_no_address_penalty", self.dco_no_address_penalty),
            ("claims_only_base", self.claims_only_base),
        ]
    }
}

/// Time budgets in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeBudgets {
    /// Soft budget for a whole request
    pub global_soft_ms: u64,
    pub registry_ms: u64,
    pub claims_ms: u64,
    pub text_inference_ms: u64,
}

impl Default for TimeBudgets {
    fn default() -> Self {
        Self {
            global_soft_ms: 1800,
            registry_ms: 200,
            claims_ms: 200,
            text_inference_ms: 900,
        }
    }
}

impl TimeBudgets {
    fn named(&self) -> [(&'static str, u64); 4] {
        [
            ("global_soft_ms", self.global_soft_ms),
            ("registry_ms", self.registry_ms),
            ("claims_ms", self.claims_ms),
            ("text_inference_ms", self.text_inference_ms),
        ]
    }
}

/// A named, versioned set of fusion constants and time budgets.
///
/// Policies are replaced as a whole; there is no per-field override once a
/// policy has been validated and published through a
/// [`PolicyHandle`](super::PolicyHandle).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub version: String,
    #[serde(default)]
    pub weights: FusionWeights,
    #[serde(default)]
    pub budgets: TimeBudgets,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            version: DEFAULT_POLICY_VERSION.to_string(),
            weights: FusionWeights::default(),
            budgets: TimeBudgets::default(),
        }
    }
}

impl Policy {
    /// Parse a policy from a JSON document. Does not validate.
    pub fn from_json(json: &str) -> PolicyResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a policy file. Does not validate.
    pub fn from_path(path: impl AsRef<Path>) -> PolicyResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Check every weight is within [0, 1] and every budget is positive.
    pub fn validate(&self) -> PolicyResult<()> {
        if self.version.trim().is_empty() {
            return Err(PolicyError::MissingVersion);
        }

        for (name, value) in self.weights.named() {
            // NaN fails the range check
            if !(0.0..=1.0).contains(&value) {
                return Err(PolicyError::OutOfRange { name, value });
            }
        }

        for (name, value) in self.budgets.named() {
            if value == 0 {
                return Err(PolicyError::NonPositiveBudget { name });
            }
        }

        Ok(())
    }
}
