//! Shared, swappable policy snapshot

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use super::error::PolicyResult;
use super::types::Policy;

/// Holds the active policy.
///
/// Readers take an `Arc` snapshot and keep using it for the whole request.
/// A swap validates the new policy first and replaces the snapshot as a
/// unit; an invalid policy never becomes visible.
#[derive(Debug, Clone)]
pub struct PolicyHandle {
    current: Arc<RwLock<Arc<Policy>>>,
}

impl PolicyHandle {
    /// Validate and publish the initial policy.
    pub fn new(policy: Policy) -> PolicyResult<Self> {
        policy.validate()?;
        info!("Policy {} active", policy.version);
        Ok(Self {
            current: Arc::new(RwLock::new(Arc::new(policy))),
        })
    }

    /// Current policy snapshot
    pub fn snapshot(&self) -> Arc<Policy> {
        self.current.read().clone()
    }

    /// Replace the active policy. Returns the previous one.
    pub fn swap(&self, policy: Policy) -> PolicyResult<Arc<Policy>> {
        policy.validate()?;
        let next = Arc::new(policy);
        let installed = Arc::clone(&next);
        let previous = std::mem::replace(&mut *self.current.write(), next);
        info!(
            "Policy swapped from {} to {}",
            previous.version, installed.version
        );
        Ok(previous)
    }
}

impl Default for PolicyHandle {
    fn default() -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(Policy::default()))),
        }
    }
}
