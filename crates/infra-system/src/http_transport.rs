// HTTP transport - posts messages to the chat service's REST API

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use sendq_core::domain::{Destination, MessagePayload};
use sendq_core::error::{AppError, Result};
use sendq_core::port::{Transport, TransportError};

#[derive(Serialize)]
struct MessageBody<'a> {
    content: &'a str,
    tts: bool,
}

/// `POST {base_url}/channels/{destination}/messages`
pub struct HttpTransport {
    client: Client,
    base_url: String,
    token: Option<String>,
    timeout_ms: u64,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout_ms: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| AppError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            timeout_ms,
        })
    }

    fn message_url(&self, destination: &Destination) -> String {
        format!("{}/channels/{}/messages", self.base_url, destination.as_str())
    }

    fn map_request_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout_ms)
        } else {
            TransportError::Connection(err.to_string())
        }
    }
}

/// `Retry-After` in delta-seconds; HTTP-date values are ignored
fn retry_after_ms(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(|secs| (secs * 1000.0).round() as u64)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        destination: &Destination,
        payload: &MessagePayload,
    ) -> std::result::Result<(), TransportError> {
        let url = self.message_url(destination);
        let mut request = self.client.post(&url).json(&MessageBody {
            content: &payload.content,
            tts: payload.tts,
        });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;
        let status = response.status();

        if status.is_success() {
            debug!(url = %url, status = status.as_u16(), "Message accepted");
            return Ok(());
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = retry_after_ms(&response);
            warn!(url = %url, retry_after_ms = ?retry_after, "Rate limited by chat service");
            return Err(TransportError::RateLimited {
                retry_after_ms: retry_after,
            });
        }

        Err(TransportError::Rejected(format!("HTTP {}", status)))
    }
}
