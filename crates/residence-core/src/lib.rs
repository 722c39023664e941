//! Residence Imputation Core
//!
//! Decides where a person lives (or lived) from up to three partially
//! overlapping sources: an authoritative death registry, a health claims
//! system and free-text inference over clinical notes. The result is one
//! decision with region/comuna codes and names, an address, a confidence in
//! `[0, 1]`, the contributing sources and the caller's audit id.
//!
//! # Modules
//!
//! - `evidence` - evidence and decision records
//! - `policy` - versioned fusion constants and time budgets
//! - `fusion` - pure deceased/alive decision rules
//! - `ports` - collaborator traits and their errors
//! - `imputer` - orchestration under a soft time budget
//! - `catalog`, `normalize`, `sources` - in-memory collaborators
//! - `contract` - request validation and error responses
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use residence_core::catalog::MemoryCatalog;
//! use residence_core::imputer::{ResidenceImputer, VitalStatus};
//! use residence_core::sources::{KeywordTextInference, MemorySource, SourceRecord};
//!
//! let catalog = MemoryCatalog::from_json(r#"{
//!     "regions": [{"code": "05", "name": "Valparaíso"}],
//!     "comunas": [{"code": "05101", "name": "Valparaíso", "region_code": "05"}]
//! }"#).unwrap();
//! let text = KeywordTextInference::new(catalog.comuna_vocabulary().to_vec());
//! let claims = MemorySource::claims()
//!     .with_record("12345678", "K", SourceRecord::found(Some("05101"), Some("Calle 1 12")));
//!
//! let imputer = ResidenceImputer::builder()
//!     .registry(Arc::new(MemorySource::registry()))
//!     .claims(Arc::new(claims))
//!     .text_inference(Arc::new(text))
//!     .catalog(Arc::new(catalog))
//!     .build()
//!     .unwrap();
//!
//! let decision = imputer
//!     .decide("12345678", "K", VitalStatus::Alive, Some("vive en Valparaíso"), None, "audit-1")
//!     .unwrap();
//! assert_eq!(decision.region_code, "05");
//! assert_eq!(decision.address, "Calle 1 12");
//! ```

pub mod catalog;
pub mod contract;
pub mod evidence;
pub mod fusion;
pub mod imputer;
pub mod normalize;
pub mod policy;
pub mod ports;
pub mod sources;

// Re-export main types at crate root
pub use evidence::{AddressQuality, Evidence, FinalDecision, InternalDecision, Origin, RulePath};
pub use fusion::{decide_alive, decide_deceased, FusionError, QualityHints};
pub use imputer::{ImputeError, ImputerOptions, ResidenceImputer, VitalStatus};
pub use policy::{Policy, PolicyError, PolicyHandle};
pub use ports::{
    AddressNormalizer, AuthoritativeRegistryReader, CatalogError, ClaimsSystemReader, CodeCatalog,
    ConnectorError, TextInferenceEngine,
};
