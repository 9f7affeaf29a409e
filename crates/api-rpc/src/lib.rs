//! JSON-RPC API Layer
//!
//! The presenter surface of the queue: snapshot and settings reads, plus the
//! enqueue, submit, pause, clear and setting-update mutations.

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use handler::RpcHandler;
pub use server::{RpcServer, RpcServerConfig};
