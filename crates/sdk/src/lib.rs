//! Sendq SDK - Rust Client Library
//!
//! Typed client for the sendq daemon's JSON-RPC API.
//!
//! # Example
//!
//! ```no_run
//! use sendq_sdk::{EnqueueRequest, SendqClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SendqClient::connect("http://127.0.0.1:9531").await?;
//!
//!     let response = client
//!         .enqueue(EnqueueRequest::text("general", "deploy finished"))
//!         .await?;
//!     println!("Queued {} ({} in queue)", response.item_id, response.queue_len);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::SendqClient;
pub use error::{Result, SdkError, CAPACITY_EXCEEDED, CONFIRMATION_REQUIRED};
pub use types::{
    ClearResponse, EnqueueRequest, EnqueueResponse, NotificationEntry, NotificationsResponse,
    PauseResponse, QueueItem, QueueSettings, SnapshotResponse, StatsResponse, SubmitResponse,
};
