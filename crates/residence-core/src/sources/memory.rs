//! In-memory registry and claims sources
//!
//! Records are keyed by `identifier-CHECKDIGIT` and either hold evidence
//! fields or a scripted failure, so every connector outcome can be
//! reproduced without a backend.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::evidence::{Evidence, Origin};
use crate::ports::{
    AuthoritativeRegistryReader, ClaimsSystemReader, ConnectorError, ConnectorResult,
};

/// Failure a record can script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptedFailure {
    NotFound,
    DataQuality,
    Auth,
    Timeout,
}

/// Evidence fields stored for a person
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordFields {
    #[serde(default)]
    pub comuna_code: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub as_of_date: Option<NaiveDate>,
}

/// Stored outcome for one person
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceRecord {
    /// `{"fail": "timeout", "message": "..."}`
    Failure {
        fail: ScriptedFailure,
        #[serde(default)]
        message: Option<String>,
    },
    /// `{"comuna_code": "13101", "address": "..."}`
    Found(RecordFields),
}

impl SourceRecord {
    pub fn found(comuna_code: Option<&str>, address: Option<&str>) -> Self {
        Self::Found(RecordFields {
            comuna_code: comuna_code.map(str::to_string),
            address: address.map(str::to_string),
            as_of_date: None,
        })
    }

    pub fn failing(fail: ScriptedFailure) -> Self {
        Self::Failure {
            fail,
            message: None,
        }
    }
}

/// Record key for an identifier and check digit
pub fn record_key(identifier: &str, check_digit: &str) -> String {
    let check_digit = check_digit.trim().to_uppercase();
    format!("{}-{}", identifier.trim(), check_digit)
}

/// Fixture-backed source for either the registry or the claims system.
#[derive(Debug, Clone)]
pub struct MemorySource {
    origin: Origin,
    records: HashMap<String, SourceRecord>,
    /// Simulated call latency; calls whose deadline is shorter time out
    latency_ms: u64,
}

impl MemorySource {
    /// Empty authoritative-registry source
    pub fn registry() -> Self {
        Self::with_origin(Origin::AuthoritativeRegistry)
    }

    /// Empty claims-system source
    pub fn claims() -> Self {
        Self::with_origin(Origin::ClaimsSystem)
    }

    fn with_origin(origin: Origin) -> Self {
        Self {
            origin,
            records: HashMap::new(),
            latency_ms: 0,
        }
    }

    pub fn with_records(mut self, records: HashMap<String, SourceRecord>) -> Self {
        self.records.extend(records);
        self
    }

    pub fn with_record(
        mut self,
        identifier: &str,
        check_digit: &str,
        record: SourceRecord,
    ) -> Self {
        self.records
            .insert(record_key(identifier, check_digit), record);
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn lookup(
        &self,
        identifier: &str,
        check_digit: &str,
        deadline_ms: u64,
    ) -> ConnectorResult<Evidence> {
        // A zero budget can never be met, even at zero latency
        if deadline_ms == 0 || self.latency_ms > deadline_ms {
            return Err(ConnectorError::Timeout {
                budget_ms: deadline_ms,
            });
        }

        let key = record_key(identifier, check_digit);
        let Some(record) = self.records.get(&key) else {
            let detail = format!("{} has no {} record", key, self.origin);
            return Err(ConnectorError::NotFound(detail));
        };

        match record {
            SourceRecord::Found(fields) => Ok(Evidence {
                origin: self.origin,
                comuna_code: fields.comuna_code.clone(),
                address: fields.address.clone(),
                model_probability: None,
                model_version: None,
                as_of_date: fields.as_of_date,
            }),
            SourceRecord::Failure { fail, message } => {
                let message = message
                    .clone()
                    .unwrap_or_else(|| format!("scripted failure for {}", key));
                Err(match fail {
                    ScriptedFailure::NotFound => ConnectorError::NotFound(message),
                    ScriptedFailure::DataQuality => ConnectorError::DataQuality(message),
                    ScriptedFailure::Auth => ConnectorError::Auth(message),
                    ScriptedFailure::Timeout => ConnectorError::Timeout {
                        budget_ms: deadline_ms,
                    },
                })
            }
        }
    }
}

impl AuthoritativeRegistryReader for MemorySource {
    fn fetch(
        &self,
        identifier: &str,
        check_digit: &str,
        deadline_ms: u64,
    ) -> ConnectorResult<Evidence> {
        self.lookup(identifier, check_digit, deadline_ms)
    }
}

impl ClaimsSystemReader for MemorySource {
    fn fetch(
        &self,
        identifier: &str,
        check_digit: &str,
        deadline_ms: u64,
    ) -> ConnectorResult<Evidence> {
        self.lookup(identifier, check_digit, deadline_ms)
    }
}

/// Fixture document holding records for both sources
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureSet {
    #[serde(default)]
    pub registry: HashMap<String, SourceRecord>,
    #[serde(default)]
    pub claims: HashMap<String, SourceRecord>,
}

impl FixtureSet {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Split into (registry, claims) sources
    pub fn into_sources(self) -> (MemorySource, MemorySource) {
        let registry = normalize_keys(self.registry);
        let claims = normalize_keys(self.claims);
        (
            MemorySource::registry().with_records(registry),
            MemorySource::claims().with_records(claims),
        )
    }
}

fn normalize_keys(records: HashMap<String, SourceRecord>) -> HashMap<String, SourceRecord> {
    records
        .into_iter()
        .map(|(key, record)| match key.rsplit_once('-') {
            Some((id, dv)) => (record_key(id, dv), record),
            None => (key, record),
        })
        .collect()
}
