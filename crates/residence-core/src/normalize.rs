//! Rule-based address normalizer
//!
//! Expands common Chilean street abbreviations, drops number markers and
//! grades the result:
//!
//! - `Exact`: a street name and a house number
//! - `Partial`: a street name without number (or explicitly `s/n`)
//! - `Unknown`: no recognizable street name

use crate::evidence::AddressQuality;
use crate::ports::{AddressNormalizer, ConnectorError, ConnectorResult};

/// Abbreviation table, matched case-insensitively on whole tokens
const EXPANSIONS: &[(&str, &str)] = &[
    ("av", "Avenida"),
    ("av.", "Avenida"),
    ("avda", "Avenida"),
    ("avda.", "Avenida"),
    ("pje", "Pasaje"),
    ("pje.", "Pasaje"),
    ("psje", "Pasaje"),
    ("psje.", "Pasaje"),
    ("pob", "Población"),
    ("pob.", "Población"),
    ("depto", "Depto"),
    ("depto.", "Depto"),
    ("dpto", "Depto"),
    ("dpto.", "Depto"),
    ("dto", "Depto"),
    ("dto.", "Depto"),
];

/// Tokens that only mark the following number
const NUMBER_MARKERS: &[&str] = &["n°", "nº", "n.", "no.", "#", "num", "num."];

/// Longest address accepted before the input is considered malformed
const MAX_ADDRESS_CHARS: usize = 512;

/// Normalizer with no external dependencies
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleNormalizer;

impl RuleNormalizer {
    pub fn new() -> Self {
        Self
    }

    fn expand(token: &str) -> Option<&'static str> {
        let lower = token.to_lowercase();
        EXPANSIONS
            .iter()
            .find(|(abbr, _)| *abbr == lower)
            .map(|(_, full)| *full)
    }

    fn is_number_marker(token: &str) -> bool {
        let lower = token.to_lowercase();
        NUMBER_MARKERS.contains(&lower.as_str())
    }
}

impl AddressNormalizer for RuleNormalizer {
    fn normalize(&self, raw: &str) -> ConnectorResult<(String, AddressQuality)> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ConnectorError::DataQuality("empty address".to_string()));
        }
        if trimmed.chars().count() > MAX_ADDRESS_CHARS {
            let detail = format!("address longer than {} characters", MAX_ADDRESS_CHARS);
            return Err(ConnectorError::DataQuality(detail));
        }

        let mut tokens: Vec<String> = Vec::new();
        let mut has_street_word = false;
        let mut has_number = false;
        let mut without_number = false;

        for token in trimmed.split_whitespace() {
            if Self::is_number_marker(token) {
                continue;
            }
            if token.eq_ignore_ascii_case("s/n") {
                without_number = true;
                tokens.push("S/N".to_string());
                continue;
            }

            // "N°123" glued to its number
            let token = token
                .strip_prefix("N°")
                .or_else(|| token.strip_prefix("n°"))
                .or_else(|| token.strip_prefix('#'))
                .filter(|rest| !rest.is_empty())
                .unwrap_or(token);

            let core = token.trim_end_matches(',');
            if core.chars().any(|c| c.is_ascii_digit()) {
                // Numbers after a unit marker (Depto 12) still count
                has_number = true;
            } else if core.chars().filter(|c| c.is_alphabetic()).count() >= 2 {
                has_street_word = true;
            }

            match Self::expand(core) {
                Some(full) if core.len() == token.len() => tokens.push(full.to_string()),
                Some(full) => tokens.push(format!("{},", full)),
                None => tokens.push(token.to_string()),
            }
        }

        let standardized = tokens.join(" ");
        let quality = match (has_street_word, has_number && !without_number) {
            (true, true) => AddressQuality::Exact,
            (true, false) => AddressQuality::Partial,
            (false, _) => AddressQuality::Unknown,
        };

        Ok((standardized, quality))
    }
}
