//! Evidence and decision types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Source that produced a piece of evidence.
///
/// Serialized with the external vocabulary used in the response contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    /// Official death-certificate registry (deceased path only)
    #[serde(rename = "DCO")]
    AuthoritativeRegistry,
    /// Health claims system
    #[serde(rename = "SIGGES")]
    ClaimsSystem,
    /// Free-text inference over clinical notes
    #[serde(rename = "NLP")]
    TextInference,
}

impl Origin {
    /// External contract label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthoritativeRegistry => "DCO",
            Self::ClaimsSystem => "SIGGES",
            Self::TextInference => "NLP",
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quality of a standardized address, as reported by a normalizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AddressQuality {
    /// Street and number resolved
    Exact,
    /// Street resolved, number or detail missing
    Partial,
    /// Text kept but not recognized as an address
    Unknown,
}

impl AddressQuality {
    /// Numeric weight used by the address bonus
    pub fn weight(&self) -> f64 {
        match self {
            Self::Exact => 1.0,
            Self::Partial => 0.7,
            Self::Unknown => 0.4,
        }
    }
}

/// Candidate residence reported by a single source for a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub origin: Origin,
    #[serde(default)]
    pub comuna_code: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Model score, text inference only
    #[serde(default)]
    pub model_probability: Option<f64>,
    /// Model version, text inference only
    #[serde(default)]
    pub model_version: Option<String>,
    #[serde(default)]
    pub as_of_date: Option<NaiveDate>,
}

impl Evidence {
    /// Empty evidence for the given origin
    pub fn new(origin: Origin) -> Self {
        Self {
            origin,
            comuna_code: None,
            address: None,
            model_probability: None,
            model_version: None,
            as_of_date: None,
        }
    }

    pub fn with_comuna(mut self, code: impl Into<String>) -> Self {
        self.comuna_code = Some(code.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_model(mut self, probability: f64, version: impl Into<String>) -> Self {
        self.model_probability = Some(probability);
        self.model_version = Some(version.into());
        self
    }

    pub fn with_as_of_date(mut self, date: NaiveDate) -> Self {
        self.as_of_date = Some(date);
        self
    }

    /// Comuna code, treating an empty string as absent
    pub fn comuna(&self) -> Option<&str> {
        self.comuna_code.as_deref().filter(|c| !c.is_empty())
    }

    /// Address text, treating an empty string as absent
    pub fn address_text(&self) -> Option<&str> {
        self.address.as_deref().filter(|a| !a.is_empty())
    }
}

/// Which fusion branch produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RulePath {
    #[serde(rename = "DECEASED_DCO")]
    DeceasedRegistry,
    #[serde(rename = "ALIVE_NLP_AGREE_SIGGES")]
    AliveTextAgreesClaims,
    #[serde(rename = "ALIVE_NLP_DISAGREE")]
    AliveTextDisagrees,
    #[serde(rename = "ALIVE_SIGGES_ONLY")]
    AliveClaimsOnly,
}

impl RulePath {
    /// Audit tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeceasedRegistry => "DECEASED_DCO",
            Self::AliveTextAgreesClaims => "ALIVE_NLP_AGREE_SIGGES",
            Self::AliveTextDisagrees => "ALIVE_NLP_DISAGREE",
            Self::AliveClaimsOnly => "ALIVE_SIGGES_ONLY",
        }
    }
}

impl std::fmt::Display for RulePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fusion engine output, before catalog mapping.
///
/// `comuna_code` is never empty, `address` uses `""` for unknown and
/// `confidence` is always within 0.0..=1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalDecision {
    pub comuna_code: String,
    pub address: String,
    pub confidence: f64,
    pub sources: Vec<Origin>,
    pub rule_path: RulePath,
    pub tie_break_reason: Option<String>,
}

/// Final decision returned to callers.
///
/// Serializes to the eight-field response contract. `rule_path` and
/// `policy_version` stay on the struct for logging and callers that audit
/// decisions in process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalDecision {
    pub region: String,
    pub region_code: String,
    pub comuna: String,
    pub comuna_code: String,
    pub address: String,
    pub confidence: f64,
    pub sources: Vec<Origin>,
    pub audit_id: String,
    #[serde(skip_serializing)]
    pub rule_path: RulePath,
    #[serde(skip_serializing)]
    pub policy_version: String,
}
