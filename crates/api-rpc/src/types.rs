//! RPC Request/Response Types
//!
//! Method parameters and results. Queue items and settings are serialized in
//! their domain shape.

use sendq_core::domain::{QueueItem, QueueSettings};
use sendq_core::port::NotificationEntry;
use serde::{Deserialize, Serialize};

/// queue.snapshot.v1
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotResponse {
    pub items: Vec<QueueItem>,
    pub paused: bool,
}

/// queue.enqueue.v1 / queue.submit.v1 params
pub use sendq_core::application::EnqueueRequest;

#[derive(Debug, Clone, Serialize)]
pub struct EnqueueResponse {
    pub item_id: String,
    pub status: String,
    pub queue_len: usize,
}

/// queue.submit.v1
#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    /// `queued` or `pass_through`
    pub outcome: String,
    pub item_id: Option<String>,
}

/// queue.pause.v1 (toggle)
#[derive(Debug, Clone, Serialize)]
pub struct PauseResponse {
    pub paused: bool,
}

/// queue.clear.v1
#[derive(Debug, Deserialize)]
pub struct ClearRequest {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub removed: usize,
}

/// settings.get.v1 returns the settings record itself
pub type SettingsResponse = QueueSettings;

/// settings.update.v1
#[derive(Debug, Deserialize)]
pub struct UpdateSettingRequest {
    pub key: String,
    pub value: serde_json::Value,
}

/// notifications.list.v1
#[derive(Debug, Default, Deserialize)]
pub struct NotificationsRequest {
    #[serde(default)]
    pub after_seq: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationsResponse {
    pub entries: Vec<NotificationEntry>,
}

/// admin.stats.v1
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub total: usize,
    pub pending: usize,
    pub sending: usize,
    pub failed: usize,
    pub paused: bool,
    pub uptime_seconds: i64,
    pub version: String,
}
