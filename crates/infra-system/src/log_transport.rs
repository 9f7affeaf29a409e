// Log transport - dry run, delivers nothing

use async_trait::async_trait;
use sendq_core::domain::{Destination, MessagePayload};
use sendq_core::port::{Transport, TransportError};
use tracing::info;

/// Logs each message and reports success
#[derive(Debug, Default)]
pub struct LogTransport;

#[async_trait]
impl Transport for LogTransport {
    async fn send(
        &self,
        destination: &Destination,
        payload: &MessagePayload,
    ) -> Result<(), TransportError> {
        info!(
            destination = %destination,
            chars = payload.content.chars().count(),
            tts = payload.tts,
            "Dry-run send"
        );
        Ok(())
    }
}
