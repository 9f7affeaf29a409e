// Queue Store - the ordered in-memory queue plus its persistence
//
// All mutations (admission, status changes, removal, clear, settings) go through
// one async mutex, so the dispatcher's scan-then-act steps never interleave with
// another writer. The record is persisted while the lock is held, keeping the
// stored order identical to the in-memory order.

use crate::application::admission::AdmissionError;
use crate::application::retry::{RetryDecision, RetryPolicy};
use crate::domain::{ItemStatus, PersistedState, QueueItem, QueueSettings, SettingKey};
use crate::error::{AppError, Result};
use crate::port::StateStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

struct QueueState {
    items: Vec<QueueItem>,
    settings: QueueSettings,
}

/// What `load` found in durable storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub items: usize,
    /// Items that were in flight when the record was written
    pub recovered_in_flight: usize,
    /// The record was unreadable and the queue was reset
    pub corrupt: bool,
}

/// Result of recording a failed attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Item stays in `FAILED` until `retry_at`
    Retrying { item: QueueItem, retry_at: i64 },
    /// Attempt ceiling reached; item removed
    Abandoned { item: QueueItem },
    /// Item disappeared meanwhile (e.g. concurrent clear)
    Missing,
}

/// Result of claiming the head of the pending queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// Item is now `SENDING`; transmit it
    Ready(QueueItem),
    /// Item had already used every attempt (e.g. recovered after a crash
    /// mid-send); it was removed without another transmission
    Exhausted(QueueItem),
}

/// Ordered collection of queue items (FIFO by admission)
pub struct QueueStore {
    state: Mutex<QueueState>,
    store: Arc<dyn StateStore>,
    default_settings: QueueSettings,
}

impl QueueStore {
    /// Create an empty store
    ///
    /// # Arguments
    /// * `store` - Durable storage for the serialized record
    /// * `default_settings` - Settings used when nothing (or garbage) is stored
    pub fn new(store: Arc<dyn StateStore>, default_settings: QueueSettings) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: Vec::new(),
                settings: default_settings.clone(),
            }),
            store,
            default_settings,
        }
    }

    /// Replace in-memory state with the stored record.
    ///
    /// A corrupt record never fails startup: the queue restarts empty with
    /// default settings. Only a storage read failure is returned as an error.
    pub async fn load(&self) -> Result<LoadReport> {
        let blob = self.store.load().await?;
        let mut state = self.state.lock().await;

        let Some(blob) = blob else {
            info!("No stored queue record, starting empty");
            state.items.clear();
            state.settings = self.default_settings.clone();
            return Ok(LoadReport {
                items: 0,
                recovered_in_flight: 0,
                corrupt: false,
            });
        };

        let in_flight_before = count_in_flight(&blob);

        match PersistedState::decode(&blob) {
            Ok(record) => {
                state.items = record.items;
                state.settings = record.settings;
                let report = LoadReport {
                    items: state.items.len(),
                    recovered_in_flight: in_flight_before,
                    corrupt: false,
                };
                info!(
                    items = report.items,
                    recovered_in_flight = report.recovered_in_flight,
                    "Queue record loaded"
                );
                Ok(report)
            }
            Err(e) => {
                warn!(error = %e, "Stored queue record is corrupt, resetting to empty queue");
                state.items.clear();
                state.settings = self.default_settings.clone();
                Ok(LoadReport {
                    items: 0,
                    recovered_in_flight: 0,
                    corrupt: true,
                })
            }
        }
    }

    /// Persist the current record, reporting storage failures to the caller
    pub async fn save(&self) -> Result<()> {
        let state = self.state.lock().await;
        let record = PersistedState::encode_parts(&state.items, &state.settings)?;
        self.store.save(&record).await
    }

    /// Read-only copy of the ordered queue
    pub async fn snapshot(&self) -> Vec<QueueItem> {
        self.state.lock().await.items.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.items.is_empty()
    }

    /// Copy of the current settings
    pub async fn settings(&self) -> QueueSettings {
        self.state.lock().await.settings.clone()
    }

    /// Append at the tail if queueing is enabled and there is room.
    ///
    /// Returns the new queue length and the settings the decision was made
    /// under. The enabled check, the capacity check and the append happen
    /// under one lock, so a concurrent settings change or admission cannot
    /// slip in between.
    pub async fn append_within_capacity(
        &self,
        item: QueueItem,
    ) -> std::result::Result<(usize, QueueSettings), AdmissionError> {
        let mut state = self.state.lock().await;
        if !state.settings.enabled {
            return Err(AdmissionError::Disabled);
        }
        let max = state.settings.max_queue_size;
        if state.items.len() >= max {
            return Err(AdmissionError::CapacityExceeded { max });
        }

        debug!(item_id = %item.id, destination = %item.destination, "Appending item");
        state.items.push(item);
        self.persist(&state).await;
        Ok((state.items.len(), state.settings.clone()))
    }

    /// Remove an item. Absent IDs are a no-op (returns false).
    pub async fn remove(&self, id: &str) -> bool {
        let mut state = self.state.lock().await;
        let removed = take_item(&mut state.items, id).is_some();
        if removed {
            self.persist(&state).await;
        }
        removed
    }

    /// Move an item along the state machine.
    ///
    /// Returns `Ok(false)` if the item is absent, an error if the transition
    /// is not allowed.
    pub async fn update_status(
        &self,
        id: &str,
        status: ItemStatus,
        error: Option<String>,
    ) -> Result<bool> {
        let mut state = self.state.lock().await;

        if status == ItemStatus::Sending && has_in_flight(&state.items) {
            return Err(AppError::Validation(
                "another item is already being sent".to_string(),
            ));
        }

        let Some(item) = state.items.iter_mut().find(|i| i.id == id) else {
            return Ok(false);
        };
        item.transition_to(status, error)?;
        self.persist(&state).await;
        Ok(true)
    }

    /// Drop every item. Returns how many were removed.
    ///
    /// Clearing an empty queue is a no-op and writes nothing.
    pub async fn clear(&self) -> usize {
        let mut state = self.state.lock().await;
        let removed = state.items.len();
        if removed == 0 {
            debug!("Clear requested on an empty queue");
            return 0;
        }
        state.items.clear();
        self.persist(&state).await;
        info!(removed = removed, "Queue cleared");
        removed
    }

    /// Mark the first pending item as sending and return a copy of it.
    ///
    /// Strict FIFO: non-pending items are skipped, never reordered. Returns
    /// `None` if nothing is pending or an item is already in flight. A pending
    /// item that already reached the policy's attempt ceiling is removed and
    /// returned as `Claim::Exhausted` instead of being sent again.
    pub async fn claim_next(&self, policy: &RetryPolicy) -> Option<Claim> {
        let mut state = self.state.lock().await;

        if has_in_flight(&state.items) {
            warn!("Claim skipped: an item is already in flight");
            return None;
        }

        let index = state
            .items
            .iter()
            .position(|i| i.status == ItemStatus::Pending)?;

        if state.items[index].attempts >= policy.max_attempts() {
            let exhausted = state.items.remove(index);
            warn!(
                item_id = %exhausted.id,
                attempts = exhausted.attempts,
                "Pending item has no attempts left, dropping it"
            );
            self.persist(&state).await;
            return Some(Claim::Exhausted(exhausted));
        }

        let item = &mut state.items[index];
        if let Err(e) = item.begin_send() {
            error!(item_id = %item.id, error = %e, "Pending item refused to start sending");
            return None;
        }
        let claimed = item.clone();

        self.persist(&state).await;
        Some(Claim::Ready(claimed))
    }

    /// Return failed items whose cool-down elapsed to pending.
    pub async fn promote_due_retries(&self, now_millis: i64) -> usize {
        let mut state = self.state.lock().await;
        let mut promoted = 0;

        for item in state.items.iter_mut() {
            if item.is_retry_due(now_millis) && item.requeue().is_ok() {
                debug!(item_id = %item.id, attempts = item.attempts, "Retry due, back to pending");
                promoted += 1;
            }
        }

        if promoted > 0 {
            self.persist(&state).await;
        }
        promoted
    }

    /// Record a failed attempt on an in-flight item and apply the retry policy
    pub async fn record_failure(
        &self,
        id: &str,
        reason: &str,
        now_millis: i64,
        policy: &RetryPolicy,
    ) -> FailureOutcome {
        let mut state = self.state.lock().await;
        let cooldown_ms = state.settings.delay_ms;

        let Some(index) = state.items.iter().position(|i| i.id == id) else {
            return FailureOutcome::Missing;
        };

        let item = &mut state.items[index];
        let decision = policy.should_retry(item, cooldown_ms);
        let retry_at = match decision {
            RetryDecision::Retry(cooldown) => {
                Some(now_millis.saturating_add(i64::try_from(cooldown).unwrap_or(i64::MAX)))
            }
            RetryDecision::Abandon => None,
        };

        if let Err(e) = item.fail(reason, retry_at) {
            error!(item_id = %id, error = %e, "Could not record failure");
            return FailureOutcome::Missing;
        }

        let outcome = match retry_at {
            Some(retry_at) => FailureOutcome::Retrying {
                item: item.clone(),
                retry_at,
            },
            None => FailureOutcome::Abandoned {
                item: state.items.remove(index),
            },
        };

        self.persist(&state).await;
        outcome
    }

    /// Validate and apply one named setting, then persist.
    ///
    /// Turning `enabled` back on never enqueues anything retroactively; it only
    /// affects future admissions. Lowering `max_queue_size` below the current
    /// length keeps existing items and blocks new ones.
    pub async fn update_setting(
        &self,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<QueueSettings> {
        let key: SettingKey = key.parse()?;
        let mut state = self.state.lock().await;

        let mut updated = state.settings.clone();
        updated.apply(key, value)?;

        if updated == state.settings {
            debug!(key = %key, "Setting unchanged");
            return Ok(updated);
        }

        let previous = std::mem::replace(&mut state.settings, updated.clone());
        if key == SettingKey::Enabled && !previous.enabled && updated.enabled {
            info!("Interception re-enabled; only new messages will be queued");
        }
        self.persist(&state).await;

        info!(key = %key, value = %value, "Setting updated");
        Ok(updated)
    }

    /// Best-effort persistence of the locked state. Failures are logged, the
    /// in-memory state stays authoritative.
    async fn persist(&self, state: &QueueState) {
        let record = match PersistedState::encode_parts(&state.items, &state.settings) {
            Ok(record) => record,
            Err(e) => {
                error!(error = %e, "Failed to encode queue record");
                return;
            }
        };

        if let Err(e) = self.store.save(&record).await {
            error!(error = %e, items = state.items.len(), "Failed to persist queue record");
        }
    }
}

fn has_in_flight(items: &[QueueItem]) -> bool {
    items.iter().any(|i| i.status == ItemStatus::Sending)
}

fn take_item(items: &mut Vec<QueueItem>, id: &str) -> Option<QueueItem> {
    let index = items.iter().position(|i| i.id == id)?;
    Some(items.remove(index))
}

// Counted from the raw record because decoding already normalizes the status.
fn count_in_flight(blob: &str) -> usize {
    serde_json::from_str::<serde_json::Value>(blob)
        .ok()
        .and_then(|v| {
            v.get("items").and_then(|items| items.as_array()).map(|items| {
                items
                    .iter()
                    .filter(|i| i.get("status").and_then(|s| s.as_str()) == Some("SENDING"))
                    .count()
            })
        })
        .unwrap_or(0)
}
