//! Fusion policy: versioned weights, bonuses, base confidences and time budgets
//!
//! A policy is loaded once (built-in defaults or a JSON document), validated,
//! and published through a [`PolicyHandle`]. Fusion reads a snapshot; it never
//! sees a partially updated policy.
//!
//! ```rust
//! use residence_core::policy::{Policy, PolicyHandle};
//!
//! let handle = PolicyHandle::new(Policy::default()).unwrap();
//! assert_eq!(handle.snapshot().weights.dco_base_conf, 0.98);
//! ```

mod error;
mod handle;
mod types;

pub use error::{PolicyError, PolicyResult};
pub use handle::PolicyHandle;
pub use types::{FusionWeights, Policy, TimeBudgets, DEFAULT_POLICY_VERSION};
