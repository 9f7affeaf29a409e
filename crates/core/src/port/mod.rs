// Port Layer - Interfaces for external collaborators

pub mod id_provider; // For deterministic testing
pub mod notifier;
pub mod state_store;
pub mod time_provider;
pub mod transport;

// Re-exports
pub use id_provider::IdProvider;
pub use notifier::{NotificationEntry, NotificationFeed, Notifier, Severity};
pub use state_store::StateStore;
pub use time_provider::TimeProvider;
pub use transport::{Transport, TransportError};
