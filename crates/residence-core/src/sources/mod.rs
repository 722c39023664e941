//! Source connectors that need no backend
//!
//! - [`MemorySource`]: fixture-backed registry and claims readers
//! - [`KeywordTextInference`]: catalog-driven comuna and address extraction
//!
//! Useful for tests, local runs and as reference implementations of the
//! [`ports`](crate::ports) contracts.

mod keyword;
mod memory;

pub use keyword::{extract_address, KeywordTextInference, KEYWORD_MODEL_VERSION};
pub use memory::{record_key, FixtureSet, MemorySource, RecordFields, ScriptedFailure, SourceRecord};
