// Stop signal for the dispatcher loop

use tokio::sync::watch;

/// Receiving half, held by the dispatcher loop
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once stop is requested, or immediately if it already was.
    /// A dropped sender counts as a stop request.
    pub async fn wait(&mut self) {
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}

/// Sending half, held by the composition root
pub struct ShutdownSender {
    tx: watch::Sender<bool>,
}

impl ShutdownSender {
    /// Ask the dispatcher loop to stop after its current tick.
    ///
    /// Returns false when no loop is listening any more.
    pub fn shutdown(&self) -> bool {
        self.tx.send(true).is_ok()
    }
}

pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSender { tx }, ShutdownToken { rx })
}
