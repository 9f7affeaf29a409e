//! Sendq Client Implementation

use crate::error::{Result, SdkError};
use crate::types::{
    ClearRequest, ClearResponse, EnqueueRequest, EnqueueResponse, NotificationsRequest,
    NotificationsResponse, PauseResponse, QueueSettings, SnapshotResponse, StatsResponse,
    SubmitResponse, UpdateSettingRequest,
};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use std::time::Duration;

/// Sendq daemon client
///
/// # Example
///
/// ```no_run
/// use sendq_sdk::SendqClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = SendqClient::connect("http://127.0.0.1:9531").await?;
/// let snapshot = client.snapshot().await?;
/// println!("{} queued", snapshot.items.len());
/// # Ok(())
/// # }
/// ```
pub struct SendqClient {
    client: HttpClient,
}

impl SendqClient {
    /// Connect to the sendq daemon
    ///
    /// # Arguments
    ///
    /// * `url` - RPC endpoint URL (e.g., `http://127.0.0.1:9531`)
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref();

        let client = HttpClientBuilder::default()
            .request_timeout(Duration::from_secs(30))
            .build(url)
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {}", e)))?;

        Ok(Self { client })
    }

    pub async fn snapshot(&self) -> Result<SnapshotResponse> {
        Ok(self.client.request("queue.snapshot.v1", rpc_params![]).await?)
    }

    /// Explicitly queue a message
    ///
    /// A full queue surfaces as `SdkError::Rpc` with code 4004
    /// (see [`SdkError::is_capacity_exceeded`]).
    pub async fn enqueue(&self, request: EnqueueRequest) -> Result<EnqueueResponse> {
        Ok(self
            .client
            .request("queue.enqueue.v1", rpc_params![request])
            .await?)
    }

    /// Submit a message the way a composer would; may pass through unqueued
    pub async fn submit(&self, request: EnqueueRequest) -> Result<SubmitResponse> {
        Ok(self
            .client
            .request("queue.submit.v1", rpc_params![request])
            .await?)
    }

    /// Toggle pause; returns the new state
    pub async fn toggle_pause(&self) -> Result<PauseResponse> {
        Ok(self.client.request("queue.pause.v1", rpc_params![]).await?)
    }

    /// Remove every queued message. Without `confirm` the daemon refuses (4005).
    pub async fn clear(&self, confirm: bool) -> Result<ClearResponse> {
        Ok(self
            .client
            .request("queue.clear.v1", rpc_params![ClearRequest { confirm }])
            .await?)
    }

    pub async fn settings(&self) -> Result<QueueSettings> {
        Ok(self.client.request("settings.get.v1", rpc_params![]).await?)
    }

    /// Update one setting by name (snake_case or camelCase)
    pub async fn update_setting(
        &self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Result<QueueSettings> {
        let request = UpdateSettingRequest {
            key: key.into(),
            value,
        };
        Ok(self
            .client
            .request("settings.update.v1", rpc_params![request])
            .await?)
    }

    /// Notifications newer than `after_seq`
    pub async fn notifications(&self, after_seq: Option<u64>) -> Result<NotificationsResponse> {
        Ok(self
            .client
            .request(
                "notifications.list.v1",
                rpc_params![NotificationsRequest { after_seq }],
            )
            .await?)
    }

    pub async fn stats(&self) -> Result<StatsResponse> {
        Ok(self.client.request("admin.stats.v1", rpc_params![]).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_rejects_bad_url() {
        let result = SendqClient::connect("not a url").await;
        assert!(matches!(result, Err(SdkError::Connection(_))));
    }

    #[test]
    fn test_enqueue_request_wire_shape() {
        let json = serde_json::to_value(EnqueueRequest::text("general", "hi")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"destination": "general", "content": "hi", "tts": false})
        );
    }
}
