//! RPC Method Handlers
//!
//! Thin adapters from JSON-RPC calls onto `QueueService`.

use crate::error::{confirmation_required, to_rpc_error};
use crate::types::{
    ClearRequest, ClearResponse, EnqueueRequest, EnqueueResponse, NotificationsRequest,
    NotificationsResponse, PauseResponse, SettingsResponse, SnapshotResponse, StatsResponse,
    SubmitResponse, UpdateSettingRequest,
};
use jsonrpsee::types::ErrorObjectOwned;
use sendq_core::application::{QueueService, SubmitOutcome};
use sendq_core::port::NotificationFeed;
use std::sync::Arc;
use tracing::info;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    service: Arc<QueueService>,
    feed: Arc<dyn NotificationFeed>,
}

impl RpcHandler {
    pub fn new(service: Arc<QueueService>, feed: Arc<dyn NotificationFeed>) -> Self {
        Self { service, feed }
    }

    /// queue.snapshot.v1
    pub async fn snapshot(&self) -> Result<SnapshotResponse, ErrorObjectOwned> {
        Ok(SnapshotResponse {
            items: self.service.snapshot().await,
            paused: self.service.stats().await.paused,
        })
    }

    /// queue.enqueue.v1
    pub async fn enqueue(
        &self,
        params: EnqueueRequest,
    ) -> Result<EnqueueResponse, ErrorObjectOwned> {
        let item = self.service.enqueue(params).await.map_err(to_rpc_error)?;
        let queue_len = self.service.snapshot().await.len();

        Ok(EnqueueResponse {
            item_id: item.id,
            status: item.status.to_string(),
            queue_len,
        })
    }

    /// queue.submit.v1
    pub async fn submit(&self, params: EnqueueRequest) -> Result<SubmitResponse, ErrorObjectOwned> {
        let outcome = self.service.submit(params).await.map_err(to_rpc_error)?;

        Ok(match outcome {
            SubmitOutcome::Queued(item) => SubmitResponse {
                outcome: "queued".to_string(),
                item_id: Some(item.id),
            },
            SubmitOutcome::PassThrough => SubmitResponse {
                outcome: "pass_through".to_string(),
                item_id: None,
            },
        })
    }

    /// queue.pause.v1
    pub fn toggle_pause(&self) -> PauseResponse {
        PauseResponse {
            paused: self.service.toggle_pause(),
        }
    }

    /// queue.clear.v1
    pub async fn clear(&self, params: ClearRequest) -> Result<ClearResponse, ErrorObjectOwned> {
        if !params.confirm {
            return Err(confirmation_required("queue.clear.v1"));
        }

        let removed = self.service.clear_queue().await;
        info!(removed = removed, "Queue cleared over RPC");
        Ok(ClearResponse { removed })
    }

    /// settings.get.v1
    pub async fn settings(&self) -> SettingsResponse {
        self.service.settings().await
    }

    /// settings.update.v1
    pub async fn update_setting(
        &self,
        params: UpdateSettingRequest,
    ) -> Result<SettingsResponse, ErrorObjectOwned> {
        self.service
            .update_setting(&params.key, &params.value)
            .await
            .map_err(to_rpc_error)
    }

    /// notifications.list.v1
    pub fn notifications(&self, params: NotificationsRequest) -> NotificationsResponse {
        NotificationsResponse {
            entries: self.feed.list(params.after_seq),
        }
    }

    /// admin.stats.v1
    pub async fn stats(&self) -> StatsResponse {
        let stats = self.service.stats().await;
        StatsResponse {
            total: stats.total,
            pending: stats.pending,
            sending: stats.sending,
            failed: stats.failed,
            paused: stats.paused,
            uptime_seconds: stats.uptime_ms / 1000,
            version: sendq_core::VERSION.to_string(),
        }
    }
}
