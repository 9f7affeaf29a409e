// Retry logic
use crate::application::dispatcher::constants::MAX_SEND_ATTEMPTS;
use crate::domain::QueueItem;
use tracing::{info, warn};

/// Retry decision result
#[derive(Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Return the item to pending after this cool-down (ms)
    Retry(u64),
    /// Attempt ceiling reached, remove the item
    Abandon,
}

/// Retry policy
///
/// The cool-down is fixed (callers pass the pacing delay), not exponential.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(MAX_SEND_ATTEMPTS)
    }
}

impl RetryPolicy {
    /// Create a new retry policy
    ///
    /// # Arguments
    /// * `max_attempts` - Attempt ceiling (at least 1)
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decide what happens to an item whose latest attempt just failed
    ///
    /// Returns:
    /// - `RetryDecision::Retry(cooldown_ms)` while attempts < ceiling
    /// - `RetryDecision::Abandon` once the ceiling is reached
    pub fn should_retry(&self, item: &QueueItem, cooldown_ms: u64) -> RetryDecision {
        if item.attempts >= self.max_attempts {
            warn!(
                item_id = %item.id,
                attempts = item.attempts,
                max_attempts = self.max_attempts,
                "Max send attempts reached"
            );
            return RetryDecision::Abandon;
        }

        info!(
            item_id = %item.id,
            attempt = item.attempts,
            max_attempts = self.max_attempts,
            cooldown_ms = cooldown_ms,
            "Scheduling retry"
        );

        RetryDecision::Retry(cooldown_ms)
    }
}
