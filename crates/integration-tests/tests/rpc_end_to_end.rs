//! SDK client against a live JSON-RPC server on an ephemeral port

use sendq_api_rpc::{RpcServer, RpcServerConfig};
use sendq_core::application::{Dispatcher, QueueService, QueueStore, TickOutcome};
use sendq_core::domain::QueueSettings;
use sendq_core::port::id_provider::mocks::SequentialIdProvider;
use sendq_core::port::state_store::mocks::InMemoryStateStore;
use sendq_core::port::time_provider::mocks::ManualTimeProvider;
use sendq_core::port::transport::mocks::ScriptedTransport;
use sendq_core::port::{NotificationFeed, Notifier};
use sendq_infra_system::FeedNotifier;
use sendq_sdk::{EnqueueRequest, SdkError, SendqClient};
use std::sync::Arc;

struct Daemon {
    client: SendqClient,
    dispatcher: Arc<Dispatcher>,
    transport: Arc<ScriptedTransport>,
    _handle: jsonrpsee::server::ServerHandle,
}

async fn start(settings: QueueSettings) -> Daemon {
    let clock = Arc::new(ManualTimeProvider::new(0));
    let store = Arc::new(QueueStore::new(Arc::new(InMemoryStateStore::new()), settings));
    let feed = Arc::new(FeedNotifier::new(clock.clone()));
    let notifier: Arc<dyn Notifier> = feed.clone();
    let transport = Arc::new(ScriptedTransport::succeeding());
    let dispatcher = Arc::new(Dispatcher::new(
        store.clone(),
        transport.clone(),
        notifier.clone(),
        clock.clone(),
    ));
    let service = Arc::new(QueueService::new(
        store,
        dispatcher.clone(),
        Arc::new(SequentialIdProvider::new()),
        clock,
        notifier,
    ));

    let config = RpcServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
    };
    let feed: Arc<dyn NotificationFeed> = feed;
    let (addr, handle) = RpcServer::new(config, service, feed).start().await.unwrap();
    let client = SendqClient::connect(format!("http://{}", addr)).await.unwrap();

    Daemon {
        client,
        dispatcher,
        transport,
        _handle: handle,
    }
}

fn instant() -> QueueSettings {
    QueueSettings {
        delay_ms: 0,
        ..QueueSettings::default()
    }
}

#[tokio::test]
async fn test_enqueue_snapshot_and_dispatch() {
    let d = start(instant()).await;

    let response = d
        .client
        .enqueue(EnqueueRequest::text("general", "hello"))
        .await
        .unwrap();
    assert_eq!(response.item_id, "item-1");
    assert_eq!(response.status, "PENDING");
    assert_eq!(response.queue_len, 1);

    let snapshot = d.client.snapshot().await.unwrap();
    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.items[0].payload.content, "hello");
    assert!(!snapshot.paused);

    assert!(matches!(d.dispatcher.tick().await, TickOutcome::Sent { .. }));
    assert_eq!(d.transport.call_count(), 1);
    assert!(d.client.snapshot().await.unwrap().items.is_empty());

    let messages: Vec<String> = d
        .client
        .notifications(None)
        .await
        .unwrap()
        .entries
        .into_iter()
        .map(|e| e.message)
        .collect();
    assert_eq!(
        messages,
        vec!["Queued! (1 total)", "Message sent to general"]
    );
}

#[tokio::test]
async fn test_capacity_error_is_typed() {
    let d = start(QueueSettings {
        max_queue_size: 1,
        ..instant()
    })
    .await;

    d.client
        .enqueue(EnqueueRequest::text("general", "one"))
        .await
        .unwrap();
    let err = d
        .client
        .enqueue(EnqueueRequest::text("general", "two"))
        .await
        .unwrap_err();

    assert!(err.is_capacity_exceeded());
    assert!(err.to_string().contains("Queue full! Max 1 messages"));
}

#[tokio::test]
async fn test_clear_requires_confirmation() {
    let d = start(instant()).await;
    d.client
        .enqueue(EnqueueRequest::text("general", "one"))
        .await
        .unwrap();

    let err = d.client.clear(false).await.unwrap_err();
    assert!(matches!(
        err,
        SdkError::Rpc { code, .. } if code == sendq_sdk::CONFIRMATION_REQUIRED
    ));
    assert_eq!(d.client.snapshot().await.unwrap().items.len(), 1);

    assert_eq!(d.client.clear(true).await.unwrap().removed, 1);
    assert!(d.client.snapshot().await.unwrap().items.is_empty());
}

#[tokio::test]
async fn test_settings_pause_and_stats() {
    let d = start(instant()).await;

    let settings = d
        .client
        .update_setting("queueOnEnter", serde_json::json!(true))
        .await
        .unwrap();
    assert!(settings.queue_on_enter);
    assert!(d.client.settings().await.unwrap().queue_on_enter);

    let submitted = d
        .client
        .submit(EnqueueRequest::text("general", "direct"))
        .await
        .unwrap();
    assert_eq!(submitted.outcome, "pass_through");
    assert!(submitted.item_id.is_none());

    let err = d
        .client
        .update_setting("max_queue_size", serde_json::json!(0))
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::Rpc { .. }));

    assert!(d.client.toggle_pause().await.unwrap().paused);
    let stats = d.client.stats().await.unwrap();
    assert!(stats.paused);
    assert_eq!(stats.total, 0);
    assert!(!stats.version.is_empty());

    let after = d.client.notifications(None).await.unwrap().entries;
    let last_seq = after.last().map(|e| e.seq);
    assert_eq!(after.last().map(|e| e.message.as_str()), Some("Queue paused"));

    assert!(!d.client.toggle_pause().await.unwrap().paused);
    let newer = d.client.notifications(last_seq).await.unwrap().entries;
    assert_eq!(newer.len(), 1);
    assert_eq!(newer[0].message, "Queue resumed");
    assert_eq!(newer[0].severity, "success");
}
