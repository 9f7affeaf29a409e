// Panic isolation for transport calls
use crate::port::TransportError;
use std::any::Any;
use std::future::Future;
use tokio::task::JoinError;
use tracing::error;

/// Run a send future on its own task so a panicking transport cannot take
/// the dispatcher loop down with it.
pub async fn send_guarded<F>(future: F) -> Result<(), TransportError>
where
    F: Future<Output = Result<(), TransportError>> + Send + 'static,
{
    match tokio::task::spawn(future).await {
        Ok(result) => result,
        Err(join_err) => Err(join_error_to_transport(join_err)),
    }
}

fn join_error_to_transport(join_err: JoinError) -> TransportError {
    if join_err.is_panic() {
        let msg = panic_message(join_err.into_panic());
        error!(panic_msg = %msg, "Transport panicked");
        TransportError::Panicked(msg)
    } else {
        error!("Transport task cancelled");
        TransportError::Panicked("send task cancelled".to_string())
    }
}

/// Best-effort extraction of a panic payload's message
pub fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
