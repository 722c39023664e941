//! Collaborator ports
//!
//! Traits for the source connectors, the address normalizer and the code
//! catalog, plus the error taxonomy they share:
//!
//! - `NotFound` / `DataQuality` / `Auth` / `Timeout` for connectors
//! - `UnknownComuna` / `UnknownRegion` for the catalog

mod error;
mod traits;

pub use error::{CatalogError, CatalogResult, ConnectorError, ConnectorResult};
pub use traits::{
    AddressNormalizer, AuthoritativeRegistryReader, ClaimsSystemReader, CodeCatalog,
    TextInferenceEngine,
};
