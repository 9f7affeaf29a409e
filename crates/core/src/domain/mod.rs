// Domain Layer - Queue items, payloads, settings and the persisted record

pub mod error;
pub mod item;
pub mod payload;
pub mod settings;
pub mod state;

// Re-exports
pub use error::DomainError;
pub use item::{ItemId, ItemStatus, QueueItem};
pub use payload::{Destination, MessagePayload, MAX_CONTENT_CHARS};
pub use settings::{QueueSettings, SettingKey};
pub use state::{PersistedState, StateDecodeError, STATE_VERSION};
