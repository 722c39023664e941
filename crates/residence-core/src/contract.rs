//! Boundary contract: request validation and error responses
//!
//! The imputer itself only raises domain failures; this module turns caller
//! input into validated arguments and any failure into one of the three
//! public error codes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::imputer::{ImputeError, VitalStatus};
use crate::ports::ConnectorError;

/// Raw impute request as received from a caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImputeRequest {
    /// National identifier without dots, dash or check digit
    pub rut: String,
    /// Check digit: 0-9 or K
    pub dv: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    /// 1 alive, 2 deceased
    pub vital_status: i64,
    #[serde(default)]
    pub ges_text: Option<String>,
    #[serde(default)]
    pub noges_text: Option<String>,
    #[serde(default)]
    pub audit_id: Option<String>,
}

/// Request after validation; names are carried but unused by the core
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub rut: String,
    pub dv: String,
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub vital_status: VitalStatus,
    pub ges_text: Option<String>,
    pub noges_text: Option<String>,
}

/// Request validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("rut must contain 6 to 8 digits without dots, dash or check digit")]
    InvalidRut,

    #[error("dv must be a single digit or K")]
    InvalidCheckDigit,

    #[error("vital_status must be 1 (alive) or 2 (deceased); got {0}")]
    InvalidVitalStatus(i64),
}

impl ImputeRequest {
    pub fn validate(&self) -> Result<ValidatedRequest, ContractError> {
        let rut = self.rut.trim();
        if !(6..=8).contains(&rut.len()) || !rut.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ContractError::InvalidRut);
        }

        let dv = self.dv.trim();
        let mut chars = dv.chars();
        let dv = match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_digit() || c.eq_ignore_ascii_case(&'k') => {
                c.to_ascii_uppercase().to_string()
            }
            _ => return Err(ContractError::InvalidCheckDigit),
        };

        let vital_status = VitalStatus::from_code(self.vital_status)
            .ok_or(ContractError::InvalidVitalStatus(self.vital_status))?;

        Ok(ValidatedRequest {
            rut: rut.to_string(),
            dv,
            name: non_blank(self.name.as_deref()),
            last_name: non_blank(self.last_name.as_deref()),
            vital_status,
            ges_text: self.ges_text.clone(),
            noges_text: self.noges_text.clone(),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Public error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    RateLimitExceeded,
    ServiceUnavailable,
}

impl ErrorCode {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ValidationError => 422,
            Self::RateLimitExceeded => 429,
            Self::ServiceUnavailable => 503,
        }
    }
}

impl From<&ImputeError> for ErrorCode {
    fn from(err: &ImputeError) -> Self {
        match err {
            ImputeError::Fusion(_) => Self::ValidationError,
            ImputeError::RegistryFailed(e) => match e {
                ConnectorError::NotFound(_) | ConnectorError::DataQuality(_) => {
                    Self::ValidationError
                }
                ConnectorError::Auth(_) | ConnectorError::Timeout { .. } => {
                    Self::ServiceUnavailable
                }
            },
            ImputeError::Normalization(_)
            | ImputeError::Catalog(_)
            | ImputeError::MissingCollaborator(_) => Self::ServiceUnavailable,
        }
    }
}

/// Error body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorCode,
    pub message: String,
    pub audit_id: String,
}

impl ErrorResponse {
    pub fn validation(err: &ContractError, audit_id: &str) -> Self {
        Self {
            error: ErrorCode::ValidationError,
            message: err.to_string(),
            audit_id: audit_id.to_string(),
        }
    }

    pub fn from_impute(err: &ImputeError, audit_id: &str) -> Self {
        Self {
            error: ErrorCode::from(err),
            message: err.to_string(),
            audit_id: audit_id.to_string(),
        }
    }
}
