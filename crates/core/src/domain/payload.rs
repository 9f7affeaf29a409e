// Message payload handed to the Transport

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Upper bound on message content, matching the chat service's own limit.
pub const MAX_CONTENT_CHARS: usize = 2000;

/// Destination conversation/channel identifier (opaque to the queue)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Destination(String);

impl Destination {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outbound message content. Immutable once enqueued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub content: String,
    #[serde(default)]
    pub tts: bool,
}

impl MessagePayload {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tts: false,
        }
    }

    /// Check the payload is something the Transport can deliver.
    pub fn validate(&self) -> Result<()> {
        if self.content.trim().is_empty() {
            return Err(DomainError::InvalidPayload(
                "content must not be empty".to_string(),
            ));
        }

        let chars = self.content.chars().count();
        if chars > MAX_CONTENT_CHARS {
            return Err(DomainError::InvalidPayload(format!(
                "content too long ({} > {} characters)",
                chars, MAX_CONTENT_CHARS
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_blank_content() {
        let err = MessagePayload::text("   \n").validate().unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_validate_rejects_oversized_content() {
        let payload = MessagePayload::text("x".repeat(MAX_CONTENT_CHARS + 1));
        let err = payload.validate().unwrap_err();
        assert!(err.to_string().contains("too long"));
    }

    #[test]
    fn test_validate_counts_characters_not_bytes() {
        // 2000 multi-byte characters is still within the limit
        let payload = MessagePayload::text("é".repeat(MAX_CONTENT_CHARS));
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn test_tts_defaults_to_false() {
        let payload: MessagePayload = serde_json::from_str(r#"{"content":"hi"}"#).unwrap();
        assert!(!payload.tts);
    }
}
