//! In-memory code catalog
//!
//! Loaded once from a JSON document and indexed with hash maps; every lookup
//! after construction is a map access.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;

use crate::ports::{CatalogError, CatalogResult, CodeCatalog};

use super::names::fold_name;

type FastMap<K, V> = HashMap<K, V, ahash::RandomState>;

/// Minimum Jaro-Winkler similarity accepted by the fuzzy name fallback
const FUZZY_MIN_SCORE: f64 = 0.92;

/// Shortest folded name the fuzzy fallback will try
const FUZZY_MIN_LENGTH: usize = 4;

/// Region row of a catalog document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionEntry {
    pub code: String,
    pub name: String,
}

/// Comuna row of a catalog document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComunaEntry {
    pub code: String,
    pub name: String,
    pub region_code: String,
}

/// Serialized catalog layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub regions: Vec<RegionEntry>,
    pub comunas: Vec<ComunaEntry>,
}

/// Hash-indexed catalog of comunas and regions.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    comunas: FastMap<String, ComunaEntry>,
    regions: FastMap<String, String>,
    by_name: FastMap<String, String>,
    /// Folded name and code, sorted by name for deterministic fuzzy scans
    vocabulary: Vec<(String, String)>,
}

impl MemoryCatalog {
    /// Build a catalog, rejecting duplicate codes and comunas whose region
    /// is not listed.
    pub fn from_document(doc: CatalogDocument) -> CatalogResult<Self> {
        let mut regions = FastMap::default();
        for region in doc.regions {
            if regions.insert(region.code.clone(), region.name).is_some() {
                let detail = format!("duplicate region code {}", region.code);
                return Err(CatalogError::InvalidData(detail));
            }
        }

        let mut comunas = FastMap::default();
        let mut by_name = FastMap::default();
        for comuna in doc.comunas {
            if !regions.contains_key(&comuna.region_code) {
                let detail = format!(
                    "comuna {} references unknown region {}",
                    comuna.code, comuna.region_code
                );
                return Err(CatalogError::InvalidData(detail));
            }
            let folded = fold_name(&comuna.name);
            by_name.entry(folded).or_insert_with(|| comuna.code.clone());
            if let Some(dup) = comunas.insert(comuna.code.clone(), comuna) {
                let detail = format!("duplicate comuna code {}", dup.code);
                return Err(CatalogError::InvalidData(detail));
            }
        }

        let mut vocabulary: Vec<(String, String)> = by_name
            .iter()
            .map(|(name, code)| (name.clone(), code.clone()))
            .collect();
        vocabulary.sort();

        Ok(Self {
            comunas,
            regions,
            by_name,
            vocabulary,
        })
    }

    /// Parse and index a JSON catalog document.
    pub fn from_json(json: &str) -> CatalogResult<Self> {
        let doc: CatalogDocument = serde_json::from_str(json)
            .map_err(|e| CatalogError::InvalidData(e.to_string()))?;
        Self::from_document(doc)
    }

    /// Read a JSON catalog file.
    pub fn from_path(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CatalogError::InvalidData(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    /// Folded comuna names with their codes, sorted by name.
    pub fn comuna_vocabulary(&self) -> &[(String, String)] {
        &self.vocabulary
    }

    pub fn comuna_count(&self) -> usize {
        self.comunas.len()
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    fn comuna(&self, code: &str) -> CatalogResult<&ComunaEntry> {
        self.comunas
            .get(code)
            .ok_or_else(|| CatalogError::UnknownComuna(code.to_string()))
    }

    fn fuzzy_code(&self, folded: &str) -> Option<String> {
        if folded.chars().count() < FUZZY_MIN_LENGTH {
            return None;
        }

        let mut best: Option<(&str, f64)> = None;
        for (name, code) in &self.vocabulary {
            let score = jaro_winkler(folded, name);
            if score < FUZZY_MIN_SCORE {
                continue;
            }
            // Strictly greater keeps the first (alphabetical) match on ties
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((code.as_str(), score));
            }
        }
        best.map(|(code, _)| code.to_string())
    }
}

impl CodeCatalog for MemoryCatalog {
    fn to_region_code(&self, comuna_code: &str) -> CatalogResult<String> {
        Ok(self.comuna(comuna_code)?.region_code.clone())
    }

    fn to_comuna_name(&self, comuna_code: &str) -> CatalogResult<String> {
        Ok(self.comuna(comuna_code)?.name.clone())
    }

    fn to_region_name(&self, region_code: &str) -> CatalogResult<String> {
        self.regions
            .get(region_code)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownRegion(region_code.to_string()))
    }

    fn to_comuna_code(&self, name_like: &str) -> Option<String> {
        let folded = fold_name(name_like);
        if folded.is_empty() {
            return None;
        }
        if let Some(code) = self.by_name.get(&folded) {
            return Some(code.clone());
        }
        self.fuzzy_code(&folded)
    }
}
