// Transport Port - the host chat system's real "send message" operation

use crate::domain::{Destination, MessagePayload};
use async_trait::async_trait;
use thiserror::Error;

/// Why a single transmission attempt failed.
///
/// The dispatcher treats every variant the same way: one failed attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Rejected by remote: {0}")]
    Rejected(String),

    #[error("Rate limited (retry after {retry_after_ms:?} ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Timed out after {0}ms")]
    Timeout(u64),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Transport panicked: {0}")]
    Panicked(String),
}

/// Transport trait
///
/// Implementations:
/// - CommandTransport: pipes the message into an external program
/// - HttpTransport: posts to the chat service's HTTP API
/// - LogTransport: dry run
///
/// The core imposes no timeout; adapters must resolve or fail in bounded time.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver one message
    async fn send(
        &self,
        destination: &Destination,
        payload: &MessagePayload,
    ) -> Result<(), TransportError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scripted outcome of one send
    #[derive(Debug, Clone)]
    pub enum MockOutcome {
        Succeed,
        Fail(String),
        /// Panic inside the transport (panic isolation testing)
        Panic(String),
        /// Sleep, then resolve with the inner outcome
        Delay(u64, Box<MockOutcome>),
    }

    /// Transport that replays a script of outcomes, then falls back to a default
    pub struct ScriptedTransport {
        script: Mutex<VecDeque<MockOutcome>>,
        fallback: MockOutcome,
        calls: Mutex<Vec<(Destination, MessagePayload)>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl ScriptedTransport {
        pub fn new(script: Vec<MockOutcome>) -> Self {
            Self::with_fallback(script, MockOutcome::Succeed)
        }

        pub fn with_fallback(script: Vec<MockOutcome>, fallback: MockOutcome) -> Self {
            Self {
                script: Mutex::new(script.into()),
                fallback,
                calls: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        pub fn succeeding() -> Self {
            Self::new(Vec::new())
        }

        pub fn failing(reason: impl Into<String>) -> Self {
            Self::with_fallback(Vec::new(), MockOutcome::Fail(reason.into()))
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn calls(&self) -> Vec<(Destination, MessagePayload)> {
            self.calls.lock().unwrap().clone()
        }

        /// Highest number of sends observed running at the same time
        pub fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }

        fn next_outcome(&self) -> MockOutcome {
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone())
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(
            &self,
            destination: &Destination,
            payload: &MessagePayload,
        ) -> Result<(), TransportError> {
            self.calls
                .lock()
                .unwrap()
                .push((destination.clone(), payload.clone()));

            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);

            let mut outcome = self.next_outcome();
            while let MockOutcome::Delay(ms, inner) = outcome {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                outcome = *inner;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match outcome {
                MockOutcome::Succeed => Ok(()),
                MockOutcome::Fail(reason) => Err(TransportError::Rejected(reason)),
                MockOutcome::Panic(msg) => panic!("{}", msg),
                MockOutcome::Delay(..) => unreachable!("delays are unwrapped above"),
            }
        }
    }
}
