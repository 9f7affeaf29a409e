// Application Layer - Use Cases and the drain loop

pub mod admission;
pub mod dispatcher;
pub mod queue_store;
pub mod retry;
pub mod service;

// Re-exports
pub use admission::{should_intercept, Admission, AdmissionError, EnqueueRequest, SubmitOutcome};
pub use dispatcher::{shutdown_channel, Dispatcher, ShutdownSender, ShutdownToken, TickOutcome};
pub use queue_store::{Claim, FailureOutcome, LoadReport, QueueStore};
pub use retry::{RetryDecision, RetryPolicy};
pub use service::{QueueService, QueueStats};
