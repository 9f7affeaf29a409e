// Queue Service - the presenter-facing facade
//
// Read access: snapshot, settings, stats. Write access: enqueue/submit,
// pause toggle, clear, setting updates. There is no other mutation path.

use crate::application::admission::{Admission, EnqueueRequest, SubmitOutcome};
use crate::application::dispatcher::Dispatcher;
use crate::application::queue_store::QueueStore;
use crate::domain::{ItemStatus, QueueItem, QueueSettings};
use crate::error::Result;
use crate::port::{IdProvider, Notifier, Severity, TimeProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Queue counters for the admin view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub total: usize,
    pub pending: usize,
    pub sending: usize,
    pub failed: usize,
    pub paused: bool,
    pub uptime_ms: i64,
}

pub struct QueueService {
    store: Arc<QueueStore>,
    admission: Admission,
    dispatcher: Arc<Dispatcher>,
    notifier: Arc<dyn Notifier>,
    time_provider: Arc<dyn TimeProvider>,
    started_at: i64,
}

impl QueueService {
    pub fn new(
        store: Arc<QueueStore>,
        dispatcher: Arc<Dispatcher>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let admission = Admission::new(
            store.clone(),
            id_provider,
            time_provider.clone(),
            notifier.clone(),
        );
        let started_at = time_provider.now_millis();
        Self {
            store,
            admission,
            dispatcher,
            notifier,
            time_provider,
            started_at,
        }
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        self.dispatcher.clone()
    }

    pub async fn snapshot(&self) -> Vec<QueueItem> {
        self.store.snapshot().await
    }

    pub async fn settings(&self) -> QueueSettings {
        self.store.settings().await
    }

    /// Explicit enqueue action
    pub async fn enqueue(&self, req: EnqueueRequest) -> Result<QueueItem> {
        let (destination, payload) = req.into_parts();
        Ok(self.admission.try_enqueue(destination, payload).await?)
    }

    /// Composer submission (honours `queue_on_enter`)
    pub async fn submit(&self, req: EnqueueRequest) -> Result<SubmitOutcome> {
        let (destination, payload) = req.into_parts();
        Ok(self.admission.submit(destination, payload).await?)
    }

    /// Returns the new paused state
    pub fn toggle_pause(&self) -> bool {
        self.dispatcher.toggle_pause()
    }

    /// Remove every item. Confirmation is the presenter's job.
    ///
    /// Clearing an empty queue is silent.
    pub async fn clear_queue(&self) -> usize {
        let removed = self.store.clear().await;
        if removed > 0 {
            self.notifier.notify("Queue cleared", Severity::Success);
        }
        removed
    }

    pub async fn update_setting(
        &self,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<QueueSettings> {
        self.store.update_setting(key, value).await
    }

    pub async fn stats(&self) -> QueueStats {
        let items = self.store.snapshot().await;
        let count = |status: ItemStatus| items.iter().filter(|i| i.status == status).count();

        QueueStats {
            total: items.len(),
            pending: count(ItemStatus::Pending),
            sending: count(ItemStatus::Sending),
            failed: count(ItemStatus::Failed),
            paused: self.dispatcher.is_paused(),
            uptime_ms: self.time_provider.now_millis() - self.started_at,
        }
    }

    /// Final persistence on shutdown
    pub async fn flush(&self) -> Result<()> {
        self.store.save().await?;
        let items = self.store.len().await;
        info!(items = items, "Queue record flushed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::admission::AdmissionError;
    use crate::error::AppError;
    use crate::port::id_provider::mocks::SequentialIdProvider;
    use crate::port::notifier::mocks::RecordingNotifier;
    use crate::port::state_store::mocks::InMemoryStateStore;
    use crate::port::time_provider::mocks::ManualTimeProvider;
    use crate::port::transport::mocks::ScriptedTransport;
    use serde_json::json;

    struct Fixture {
        service: QueueService,
        notifier: Arc<RecordingNotifier>,
        clock: Arc<ManualTimeProvider>,
        backing: Arc<InMemoryStateStore>,
    }

    fn fixture(settings: QueueSettings) -> Fixture {
        let backing = Arc::new(InMemoryStateStore::new());
        let store = Arc::new(QueueStore::new(backing.clone(), settings));
        let notifier = Arc::new(RecordingNotifier::new());
        let clock = Arc::new(ManualTimeProvider::new(10_000));
        let dispatcher = Arc::new(Dispatcher::new(
            store.clone(),
            Arc::new(ScriptedTransport::succeeding()),
            notifier.clone(),
            clock.clone(),
        ));
        let service = QueueService::new(
            store,
            dispatcher,
            Arc::new(SequentialIdProvider::new()),
            clock.clone(),
            notifier.clone(),
        );
        Fixture {
            service,
            notifier,
            clock,
            backing,
        }
    }

    fn req(content: &str) -> EnqueueRequest {
        EnqueueRequest {
            destination: "general".to_string(),
            content: content.to_string(),
            tts: false,
        }
    }

    #[tokio::test]
    async fn test_enqueue_and_stats() {
        let f = fixture(QueueSettings::default());
        f.service.enqueue(req("a")).await.unwrap();
        f.service.enqueue(req("b")).await.unwrap();
        f.clock.advance(250);

        let stats = f.service.stats().await;
        assert_eq!(stats.total, 2);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.sending, 0);
        assert!(!stats.paused);
        assert_eq!(stats.uptime_ms, 250);
    }

    #[tokio::test]
    async fn test_enqueue_capacity_error_maps_to_app_error() {
        let f = fixture(QueueSettings {
            max_queue_size: 1,
            ..QueueSettings::default()
        });
        f.service.enqueue(req("a")).await.unwrap();

        let err = f.service.enqueue(req("b")).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Admission(AdmissionError::CapacityExceeded { max: 1 })
        ));
    }

    #[tokio::test]
    async fn test_clear_queue_notifies_and_persists() {
        let f = fixture(QueueSettings::default());
        f.service.enqueue(req("a")).await.unwrap();

        assert_eq!(f.service.clear_queue().await, 1);
        assert!(f.service.snapshot().await.is_empty());
        assert!(f.notifier.contains("Queue cleared"));
        assert!(f.backing.record().unwrap().contains("\"items\":[]"));
    }

    #[tokio::test]
    async fn test_clear_empty_queue_is_silent() {
        let f = fixture(QueueSettings::default());

        assert_eq!(f.service.clear_queue().await, 0);
        assert!(!f.notifier.contains("Queue cleared"));
        assert_eq!(f.backing.save_count(), 0);
    }

    #[tokio::test]
    async fn test_toggle_pause_reflected_in_stats() {
        let f = fixture(QueueSettings::default());
        assert!(f.service.toggle_pause());
        assert!(f.service.stats().await.paused);
        assert!(!f.service.toggle_pause());
    }

    #[tokio::test]
    async fn test_flush_reports_storage_failure() {
        let f = fixture(QueueSettings::default());
        f.service.enqueue(req("a")).await.unwrap();
        tokio_test::assert_ok!(f.service.flush().await);

        f.backing.set_fail_saves(true);
        tokio_test::assert_err!(f.service.flush().await);
    }

    #[tokio::test]
    async fn test_update_setting_round_trips() {
        let f = fixture(QueueSettings::default());
        let settings = f
            .service
            .update_setting("showNotifications", &json!(false))
            .await
            .unwrap();
        assert!(!settings.show_notifications);
        assert_eq!(f.service.settings().await, settings);
    }
}
