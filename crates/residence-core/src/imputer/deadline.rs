//! Per-request soft time budget

use std::time::{Duration, Instant};

/// Monotonic deadline for one request.
///
/// The budget is soft: it shapes the deadline handed to each connector but
/// does not preempt anything.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    budget: Duration,
}

impl Deadline {
    /// Start the clock now
    pub fn start(budget_ms: u64) -> Self {
        Self::starting_at(Instant::now(), budget_ms)
    }

    /// Clock that started at `started`
    pub fn starting_at(started: Instant, budget_ms: u64) -> Self {
        Self {
            started,
            budget: Duration::from_millis(budget_ms),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        duration_ms(self.started.elapsed())
    }

    /// Milliseconds left in the budget, never below zero
    pub fn remaining_ms(&self) -> u64 {
        duration_ms(self.budget.saturating_sub(self.started.elapsed()))
    }

    /// Deadline for a connector: its own budget capped by what is left
    pub fn budget_for(&self, per_call_ms: u64) -> u64 {
        per_call_ms.min(self.remaining_ms())
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_ms() == 0
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
