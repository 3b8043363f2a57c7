//! Fixed-delay retry budget used by the bootstrap procedures.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of attempts for health checks and model loading.
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// Default delay between attempts, in milliseconds.
pub const DEFAULT_DELAY_MS: u64 = 2000;

/// A bounded, fixed-delay retry budget.
///
/// Every attempt consumes one unit of `attempts_remaining`; a failed attempt is
/// retried after `delay_ms` only while units remain. The delay never grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPlan {
    pub attempts_remaining: u32,
    pub delay_ms: u64,
}

impl RetryPlan {
    /// Creates a plan. A zero delay is raised to one millisecond.
    pub fn new(attempts_remaining: u32, delay_ms: u64) -> Self {
        Self {
            attempts_remaining,
            delay_ms: delay_ms.max(1),
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts_remaining == 0
    }

    /// Consumes one attempt. Returns `false` when the budget was already empty.
    pub fn consume(&mut self) -> bool {
        if self.attempts_remaining == 0 {
            return false;
        }
        self.attempts_remaining -= 1;
        true
    }
}

impl Default for RetryPlan {
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPTS, DEFAULT_DELAY_MS)
    }
}
