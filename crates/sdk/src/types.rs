//! SDK Request/Response Types
//!
//! Mirrors the JSON-RPC types from the api-rpc crate.

use serde::{Deserialize, Serialize};

/// Message to enqueue or submit
#[derive(Debug, Clone, Serialize)]
pub struct EnqueueRequest {
    pub destination: String,
    pub content: String,
    pub tts: bool,
}

impl EnqueueRequest {
    pub fn text(destination: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            content: content.into(),
            tts: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnqueueResponse {
    pub item_id: String,
    pub status: String,
    pub queue_len: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    pub outcome: String,
    pub item_id: Option<String>,
}

/// Queue item as reported by the daemon
#[derive(Debug, Clone, Deserialize)]
pub struct QueueItem {
    pub id: String,
    pub destination: String,
    pub payload: MessagePayload,
    pub status: String,
    pub attempts: u32,
    pub enqueued_at: i64,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default)]
    pub next_attempt_at: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagePayload {
    pub content: String,
    #[serde(default)]
    pub tts: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotResponse {
    pub items: Vec<QueueItem>,
    pub paused: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PauseResponse {
    pub paused: bool,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ClearRequest {
    pub confirm: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClearResponse {
    pub removed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSettings {
    pub enabled: bool,
    pub delay_ms: u64,
    pub max_queue_size: usize,
    pub auto_send: bool,
    pub show_notifications: bool,
    pub queue_on_enter: bool,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct UpdateSettingRequest {
    pub key: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct NotificationsRequest {
    pub after_seq: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationEntry {
    pub seq: u64,
    pub message: String,
    pub severity: String,
    pub at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsResponse {
    pub entries: Vec<NotificationEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatsResponse {
    pub total: usize,
    pub pending: usize,
    pub sending: usize,
    pub failed: usize,
    pub paused: bool,
    pub uptime_seconds: i64,
    pub version: String,
}
