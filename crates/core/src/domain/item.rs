// Queue Item Domain Model

use crate::domain::error::{DomainError, Result};
use crate::domain::payload::{Destination, MessagePayload};
use serde::{Deserialize, Serialize};

/// Queue item ID (UUID v4 in production)
pub type ItemId = String;

/// Stored item status.
///
/// `sent` and `abandoned` are not statuses: both are removals from the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    Pending,
    Sending,
    Failed,
}

impl ItemStatus {
    /// Edges of the per-item state machine.
    pub fn can_transition_to(self, to: ItemStatus) -> bool {
        matches!(
            (self, to),
            (ItemStatus::Pending, ItemStatus::Sending)
                | (ItemStatus::Sending, ItemStatus::Failed)
                | (ItemStatus::Sending, ItemStatus::Pending)
                | (ItemStatus::Failed, ItemStatus::Pending)
        )
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemStatus::Pending => write!(f, "PENDING"),
            ItemStatus::Sending => write!(f, "SENDING"),
            ItemStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// One deferred outbound message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: ItemId,
    pub destination: Destination,
    pub payload: MessagePayload,
    pub status: ItemStatus,
    /// Transmission attempts started so far. Never decreases.
    #[serde(default)]
    pub attempts: u32,
    pub enqueued_at: i64, // epoch ms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Earliest time (epoch ms) a failed item may return to pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_attempt_at: Option<i64>,
}

impl QueueItem {
    /// Create a new pending item
    ///
    /// # Arguments
    ///
    /// * `id` - Unique item ID (injected, not generated)
    /// * `enqueued_at` - Admission timestamp in epoch ms (injected, not system time)
    /// * `destination` - Target conversation/channel
    /// * `payload` - Message content
    pub fn new(
        id: impl Into<String>,
        enqueued_at: i64,
        destination: Destination,
        payload: MessagePayload,
    ) -> Self {
        Self {
            id: id.into(),
            destination,
            payload,
            status: ItemStatus::Pending,
            attempts: 0,
            enqueued_at,
            last_error: None,
            next_attempt_at: None,
        }
    }

    /// Pending -> Sending. Counts one transmission attempt.
    pub fn begin_send(&mut self) -> Result<()> {
        self.check_transition(ItemStatus::Sending)?;
        self.status = ItemStatus::Sending;
        self.attempts += 1;
        self.next_attempt_at = None;
        Ok(())
    }

    /// Sending -> Failed, recording why and when the item may be retried.
    pub fn fail(&mut self, reason: impl Into<String>, next_attempt_at: Option<i64>) -> Result<()> {
        self.check_transition(ItemStatus::Failed)?;
        self.status = ItemStatus::Failed;
        self.last_error = Some(reason.into());
        self.next_attempt_at = next_attempt_at;
        Ok(())
    }

    /// Failed -> Pending. The item keeps its queue position.
    pub fn requeue(&mut self) -> Result<()> {
        if self.status != ItemStatus::Failed {
            return Err(self.invalid(ItemStatus::Pending));
        }
        self.status = ItemStatus::Pending;
        self.last_error = None;
        self.next_attempt_at = None;
        Ok(())
    }

    /// Sending -> Pending for an item that was in flight when the process stopped.
    ///
    /// Returns true if the item was in flight.
    pub fn recover_in_flight(&mut self) -> bool {
        if self.status == ItemStatus::Sending {
            self.status = ItemStatus::Pending;
            true
        } else {
            false
        }
    }

    /// Generic transition used by `QueueStore::update_status`.
    pub fn transition_to(&mut self, status: ItemStatus, error: Option<String>) -> Result<()> {
        match status {
            ItemStatus::Sending => self.begin_send(),
            ItemStatus::Failed => self.fail(
                error.unwrap_or_else(|| "unspecified failure".to_string()),
                None,
            ),
            ItemStatus::Pending if self.status == ItemStatus::Sending => {
                self.recover_in_flight();
                Ok(())
            }
            ItemStatus::Pending => self.requeue(),
        }
    }

    /// True if this failed item's cool-down has elapsed.
    pub fn is_retry_due(&self, now_millis: i64) -> bool {
        self.status == ItemStatus::Failed
            && self.next_attempt_at.map_or(true, |at| at <= now_millis)
    }

    fn check_transition(&self, to: ItemStatus) -> Result<()> {
        if self.status.can_transition_to(to) {
            Ok(())
        } else {
            Err(self.invalid(to))
        }
    }

    fn invalid(&self, to: ItemStatus) -> DomainError {
        DomainError::InvalidStateTransition {
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }
}
