// Persisted Record (one per installation)

use crate::domain::item::QueueItem;
use crate::domain::settings::QueueSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current record layout version
pub const STATE_VERSION: u32 = 1;

/// Why a stored record could not be used
#[derive(Error, Debug)]
pub enum StateDecodeError {
    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unsupported record version {0}")]
    UnsupportedVersion(u32),

    #[error("invalid settings: {0}")]
    InvalidSettings(#[from] crate::domain::DomainError),
}

/// Serialized form of the queue plus its settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub version: u32,
    pub items: Vec<QueueItem>,
    #[serde(default)]
    pub settings: QueueSettings,
}

#[derive(Serialize)]
struct RecordView<'a> {
    version: u32,
    items: &'a [QueueItem],
    settings: &'a QueueSettings,
}

impl PersistedState {
    pub fn new(items: Vec<QueueItem>, settings: QueueSettings) -> Self {
        Self {
            version: STATE_VERSION,
            items,
            settings,
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        Self::encode_parts(&self.items, &self.settings)
    }

    /// Encode without taking ownership of the live queue
    pub fn encode_parts(
        items: &[QueueItem],
        settings: &QueueSettings,
    ) -> Result<String, serde_json::Error> {
        serde_json::to_string(&RecordView {
            version: STATE_VERSION,
            items,
            settings,
        })
    }

    /// Decode a stored record.
    ///
    /// Items that were in flight when the record was written come back as pending;
    /// nothing resumes "sending" after a restart.
    pub fn decode(blob: &str) -> Result<Self, StateDecodeError> {
        let mut state: PersistedState = serde_json::from_str(blob)?;
        if state.version > STATE_VERSION {
            return Err(StateDecodeError::UnsupportedVersion(state.version));
        }
        state.settings.validate()?;

        for item in state.items.iter_mut() {
            item.recover_in_flight();
        }
        state.version = STATE_VERSION;

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Destination, ItemStatus, MessagePayload};

    fn sample_items() -> Vec<QueueItem> {
        let pending = QueueItem::new("a", 1, Destination::new("c1"), MessagePayload::text("one"));

        let mut sending =
            QueueItem::new("b", 2, Destination::new("c1"), MessagePayload::text("two"));
        sending.begin_send().unwrap();

        let mut failed =
            QueueItem::new("c", 3, Destination::new("c2"), MessagePayload::text("three"));
        failed.begin_send().unwrap();
        failed.fail("HTTP 429", Some(10)).unwrap();

        vec![pending, sending, failed]
    }

    #[test]
    fn test_decode_normalizes_sending_to_pending() {
        let items = sample_items();
        let blob = PersistedState::new(items.clone(), QueueSettings::default())
            .encode()
            .unwrap();

        let decoded = PersistedState::decode(&blob).unwrap();

        assert_eq!(decoded.items.len(), 3);
        assert_eq!(decoded.items[0], items[0]);
        assert_eq!(decoded.items[1].status, ItemStatus::Pending);
        assert_eq!(decoded.items[1].attempts, 1);
        assert_eq!(decoded.items[2], items[2]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            PersistedState::decode("{not json"),
            Err(StateDecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_rejects_future_version() {
        let blob = r#"{"version": 99, "items": []}"#;
        assert!(matches!(
            PersistedState::decode(blob),
            Err(StateDecodeError::UnsupportedVersion(99))
        ));
    }

    #[test]
    fn test_decode_rejects_zero_capacity() {
        let blob = r#"{"version": 1, "items": [], "settings": {"max_queue_size": 0}}"#;
        assert!(matches!(
            PersistedState::decode(blob),
            Err(StateDecodeError::InvalidSettings(_))
        ));
    }
}
