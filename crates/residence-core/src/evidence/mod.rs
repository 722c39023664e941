//! Shared vocabulary: per-source evidence and decision records
//!
//! ```rust
//! use residence_core::evidence::{Evidence, Origin};
//!
//! let ev = Evidence::new(Origin::ClaimsSystem).with_comuna("13101");
//! assert_eq!(ev.comuna(), Some("13101"));
//! ```

mod types;

pub use types::{AddressQuality, Evidence, FinalDecision, InternalDecision, Origin, RulePath};
