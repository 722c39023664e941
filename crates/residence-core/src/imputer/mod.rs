//! Source orchestration
//!
//! [`ResidenceImputer::decide`] runs one request:
//!
//! 1. **Deceased**: registry lookup (fatal on failure) → deceased rule
//! 2. **Alive**: claims lookup, then text inference on the non-empty free
//!    texts; each failure degrades to "no evidence" → alive rule
//! 3. Catalog mapping of comuna and region codes to names
//!
//! Each connector receives `min(own budget, remaining soft budget)` as its
//! deadline.

mod deadline;
mod error;
mod orchestrator;

pub use deadline::Deadline;
pub use error::{ImputeError, ImputeResult};
pub use orchestrator::{ImputerOptions, ResidenceImputer, ResidenceImputerBuilder, VitalStatus};
