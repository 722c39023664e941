//! Evidence fusion
//!
//! Turns zero to three source evidences into one ranked decision:
//!
//! - **Deceased**: the authoritative registry decides, confidence from a base
//!   value with a penalty when the address is missing
//! - **Alive / agreement**: text inference and claims name the same comuna;
//!   address from claims, agreement boost applied
//! - **Alive / disagreement**: text inference names a comuna the claims system
//!   does not confirm (or claims is absent); address from text
//! - **Alive / claims only**: text inference has no comuna
//!
//! Every branch clamps its confidence into `[0, 1]` as the last step.
//!
//! # Example
//!
//! ```rust
//! use residence_core::evidence::{Evidence, Origin, RulePath};
//! use residence_core::fusion::{decide_alive, QualityHints};
//! use residence_core::policy::Policy;
//!
//! let text = Evidence::new(Origin::TextInference)
//!     .with_comuna("05101")
//!     .with_model(0.8, "kw-1");
//! let hints = QualityHints::default();
//! let decision = decide_alive(Some(&text), None, hints, &Policy::default()).unwrap();
//! assert_eq!(decision.rule_path, RulePath::AliveTextDisagrees);
//! ```

mod error;
mod quality;
mod rules;

pub use error::{DecisionPath, FusionError, FusionResult};
pub use quality::{clamp, quality_weight};
pub use rules::{decide_alive, decide_deceased, QualityHints};
