//! Comuna and region code catalog
//!
//! [`MemoryCatalog`] implements [`CodeCatalog`](crate::ports::CodeCatalog)
//! from a JSON document:
//!
//! ```json
//! {
//!   "regions": [{"code": "02", "name": "Antofagasta"}],
//!   "comunas": [{"code": "02101", "name": "Antofagasta", "region_code": "02"}]
//! }
//! ```

mod memory;
mod names;

pub use memory::{CatalogDocument, ComunaEntry, MemoryCatalog, RegionEntry};
pub use names::fold_name;
