// Admission - deciding whether an outbound message is deferred, and queueing it

use crate::application::queue_store::QueueStore;
use crate::domain::{Destination, MessagePayload, QueueItem, QueueSettings};
use crate::port::{IdProvider, Notifier, Severity, TimeProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a message was not admitted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("Queue full! Max {max} messages")]
    CapacityExceeded { max: usize },

    #[error("Queueing is disabled")]
    Disabled,

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

/// Enqueue request as received from a presenter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueRequest {
    pub destination: String,
    pub content: String,

    #[serde(default)]
    pub tts: bool,
}

impl EnqueueRequest {
    pub fn into_parts(self) -> (Destination, MessagePayload) {
        (
            Destination::new(self.destination),
            MessagePayload {
                content: self.content,
                tts: self.tts,
            },
        )
    }
}

/// What happened to a composer submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Deferred into the queue
    Queued(QueueItem),
    /// Not intercepted; the host sends it directly
    PassThrough,
}

/// Interception predicate.
///
/// `queue_on_enter` makes plain submissions bypass the queue while the explicit
/// enqueue action keeps working.
pub fn should_intercept(settings: &QueueSettings) -> bool {
    settings.enabled && !settings.queue_on_enter
}

/// Admission use cases over a shared queue store
pub struct Admission {
    store: Arc<QueueStore>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    notifier: Arc<dyn Notifier>,
}

impl Admission {
    pub fn new(
        store: Arc<QueueStore>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            id_provider,
            time_provider,
            notifier,
        }
    }

    /// Admit a message at the tail of the queue.
    ///
    /// On any error the queue is unchanged. Capacity errors are returned, not
    /// notified; callers that want the toast use `submit`. The enabled flag and
    /// the notification switch are read under the same lock as the append.
    pub async fn try_enqueue(
        &self,
        destination: Destination,
        payload: MessagePayload,
    ) -> std::result::Result<QueueItem, AdmissionError> {
        payload
            .validate()
            .map_err(|e| AdmissionError::InvalidPayload(e.to_string()))?;

        let item = QueueItem::new(
            self.id_provider.generate_id(),
            self.time_provider.now_millis(),
            destination,
            payload,
        );

        let (total, settings) = match self.store.append_within_capacity(item.clone()).await {
            Ok(appended) => appended,
            Err(AdmissionError::Disabled) => {
                debug!(destination = %item.destination, "Admission refused: queueing disabled");
                return Err(AdmissionError::Disabled);
            }
            Err(e) => return Err(e),
        };

        info!(
            item_id = %item.id,
            destination = %item.destination,
            total = total,
            "Message queued"
        );

        if settings.show_notifications {
            self.notifier
                .notify(&format!("Queued! ({} total)", total), Severity::Success);
        }

        Ok(item)
    }

    /// Composer entry point: intercept if configured, otherwise pass through.
    ///
    /// A full queue is reported to the operator and returned as an error so the
    /// host does not send the message either.
    pub async fn submit(
        &self,
        destination: Destination,
        payload: MessagePayload,
    ) -> std::result::Result<SubmitOutcome, AdmissionError> {
        let settings = self.store.settings().await;
        if !should_intercept(&settings) {
            return Ok(SubmitOutcome::PassThrough);
        }

        match self.try_enqueue(destination, payload).await {
            Ok(item) => Ok(SubmitOutcome::Queued(item)),
            Err(e @ AdmissionError::CapacityExceeded { .. }) => {
                warn!(error = %e, "Submission refused");
                self.notifier.notify(&e.to_string(), Severity::Failure);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ItemStatus;
    use crate::port::id_provider::mocks::SequentialIdProvider;
    use crate::port::notifier::mocks::RecordingNotifier;
    use crate::port::state_store::mocks::InMemoryStateStore;
    use crate::port::time_provider::mocks::ManualTimeProvider;
    use serde_json::json;

    struct Fixture {
        admission: Admission,
        store: Arc<QueueStore>,
        notifier: Arc<RecordingNotifier>,
    }

    fn fixture(settings: QueueSettings) -> Fixture {
        let store = Arc::new(QueueStore::new(
            Arc::new(InMemoryStateStore::new()),
            settings,
        ));
        let notifier = Arc::new(RecordingNotifier::new());
        let admission = Admission::new(
            store.clone(),
            Arc::new(SequentialIdProvider::new()),
            Arc::new(ManualTimeProvider::new(5_000)),
            notifier.clone(),
        );
        Fixture {
            admission,
            store,
            notifier,
        }
    }

    fn dest() -> Destination {
        Destination::new("general")
    }

    #[test]
    fn test_should_intercept() {
        let mut settings = QueueSettings::default();
        assert!(should_intercept(&settings));

        settings.queue_on_enter = true;
        assert!(!should_intercept(&settings));

        settings.queue_on_enter = false;
        settings.enabled = false;
        assert!(!should_intercept(&settings));
    }

    #[tokio::test]
    async fn test_try_enqueue_creates_pending_item_and_notifies() {
        let f = fixture(QueueSettings::default());

        let item = f
            .admission
            .try_enqueue(dest(), MessagePayload::text("hi"))
            .await
            .unwrap();

        assert_eq!(item.id, "item-1");
        assert_eq!(item.status, ItemStatus::Pending);
        assert_eq!(item.attempts, 0);
        assert_eq!(item.enqueued_at, 5_000);
        assert_eq!(f.notifier.entries(), vec![("Queued! (1 total)".to_string(), Severity::Success)]);
    }

    #[tokio::test]
    async fn test_try_enqueue_respects_notification_switch() {
        let f = fixture(QueueSettings {
            show_notifications: false,
            ..QueueSettings::default()
        });

        f.admission
            .try_enqueue(dest(), MessagePayload::text("quiet"))
            .await
            .unwrap();
        assert!(f.notifier.entries().is_empty());
    }

    #[tokio::test]
    async fn test_try_enqueue_rejects_when_disabled() {
        let f = fixture(QueueSettings {
            enabled: false,
            ..QueueSettings::default()
        });

        let err = f
            .admission
            .try_enqueue(dest(), MessagePayload::text("hi"))
            .await
            .unwrap_err();
        assert_eq!(err, AdmissionError::Disabled);
        assert!(f.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_try_enqueue_rejects_invalid_payload() {
        let f = fixture(QueueSettings::default());

        let err = f
            .admission
            .try_enqueue(dest(), MessagePayload::text("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, AdmissionError::InvalidPayload(ref m) if m.contains("empty")));

        let long = "x".repeat(crate::domain::MAX_CONTENT_CHARS + 1);
        let err = f
            .admission
            .try_enqueue(dest(), MessagePayload::text(long))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("too long"));
        assert!(f.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_capacity_rejection_leaves_queue_unchanged() {
        let f = fixture(QueueSettings {
            max_queue_size: 2,
            ..QueueSettings::default()
        });

        for text in ["A", "B"] {
            f.admission
                .try_enqueue(dest(), MessagePayload::text(text))
                .await
                .unwrap();
        }
        let err = f
            .admission
            .try_enqueue(dest(), MessagePayload::text("C"))
            .await
            .unwrap_err();

        assert_eq!(err, AdmissionError::CapacityExceeded { max: 2 });
        let contents: Vec<_> = f
            .store
            .snapshot()
            .await
            .into_iter()
            .map(|i| i.payload.content)
            .collect();
        assert_eq!(contents, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_submit_passes_through_when_queue_on_enter() {
        let f = fixture(QueueSettings {
            queue_on_enter: true,
            ..QueueSettings::default()
        });

        let outcome = f
            .admission
            .submit(dest(), MessagePayload::text("direct"))
            .await
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::PassThrough);
        assert!(f.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_submit_when_full_notifies_operator() {
        let f = fixture(QueueSettings {
            max_queue_size: 1,
            ..QueueSettings::default()
        });

        let first = f
            .admission
            .submit(dest(), MessagePayload::text("one"))
            .await
            .unwrap();
        assert!(matches!(first, SubmitOutcome::Queued(_)));

        let err = f
            .admission
            .submit(dest(), MessagePayload::text("two"))
            .await
            .unwrap_err();
        assert_eq!(err, AdmissionError::CapacityExceeded { max: 1 });
        assert!(f.notifier.contains("Queue full! Max 1 messages"));
        assert_eq!(f.notifier.count(Severity::Failure), 1);
    }

    #[tokio::test]
    async fn test_reenabling_does_not_enqueue_retroactively() {
        let f = fixture(QueueSettings::default());
        f.store.update_setting("enabled", &json!(false)).await.unwrap();
        let _ = f
            .admission
            .submit(dest(), MessagePayload::text("while off"))
            .await
            .unwrap();

        f.store.update_setting("enabled", &json!(true)).await.unwrap();
        assert!(f.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_try_enqueue_uses_settings_from_the_append() {
        let f = fixture(QueueSettings::default());
        f.admission
            .try_enqueue(dest(), MessagePayload::text("loud"))
            .await
            .unwrap();

        f.store
            .update_setting("showNotifications", &json!(false))
            .await
            .unwrap();
        f.admission
            .try_enqueue(dest(), MessagePayload::text("quiet"))
            .await
            .unwrap();

        f.store.update_setting("enabled", &json!(false)).await.unwrap();
        let err = f
            .admission
            .try_enqueue(dest(), MessagePayload::text("refused"))
            .await
            .unwrap_err();

        assert_eq!(err, AdmissionError::Disabled);
        assert_eq!(f.store.len().await, 2);
        assert_eq!(f.notifier.entries(), vec![("Queued! (1 total)".to_string(), Severity::Success)]);
    }

    #[test]
    fn test_enqueue_request_defaults_tts() {
        let req: EnqueueRequest =
            serde_json::from_value(json!({"destination": "general", "content": "hi"})).unwrap();
        let (destination, payload) = req.into_parts();
        assert_eq!(destination.as_str(), "general");
        assert!(!payload.tts);
    }
}
