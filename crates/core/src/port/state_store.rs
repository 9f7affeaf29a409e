// State Store Port (opaque durable storage)

use crate::error::Result;
use async_trait::async_trait;

/// Durable storage for the installation's single serialized record.
///
/// The store never interprets the blob; encoding and corruption handling
/// belong to the core.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the stored record, `None` on first run
    async fn load(&self) -> Result<Option<String>>;

    /// Replace the stored record
    async fn save(&self, record: &str) -> Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory store that can be seeded with arbitrary (even corrupt) content
    #[derive(Default)]
    pub struct InMemoryStateStore {
        record: Mutex<Option<String>>,
        save_count: AtomicUsize,
        fail_saves: AtomicBool,
    }

    impl InMemoryStateStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_record(record: impl Into<String>) -> Self {
            let store = Self::default();
            *store.record.lock().unwrap() = Some(record.into());
            store
        }

        pub fn record(&self) -> Option<String> {
            self.record.lock().unwrap().clone()
        }

        pub fn save_count(&self) -> usize {
            self.save_count.load(Ordering::SeqCst)
        }

        /// Make every subsequent save fail
        pub fn set_fail_saves(&self, fail: bool) {
            self.fail_saves.store(fail, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl StateStore for InMemoryStateStore {
        async fn load(&self) -> Result<Option<String>> {
            Ok(self.record.lock().unwrap().clone())
        }

        async fn save(&self, record: &str) -> Result<()> {
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(AppError::Storage("disk full".to_string()));
            }
            *self.record.lock().unwrap() = Some(record.to_string());
            self.save_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}
