// Dispatcher - paced, single-flight drain loop

pub mod constants;
mod panic_guard;
mod shutdown;

use constants::*;
pub use panic_guard::{panic_message, send_guarded};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::application::queue_store::{Claim, FailureOutcome, QueueStore};
use crate::application::retry::RetryPolicy;
use crate::domain::{ItemId, QueueItem};
use crate::port::{Notifier, Severity, TimeProvider, Transport, TransportError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// What a single tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Operator paused the queue
    Paused,
    /// `auto_send` is off; the queue only accumulates
    AutoSendOff,
    /// A previous tick is still sending
    Busy,
    /// Nothing pending
    Idle,
    Sent { item_id: ItemId },
    Retrying { item_id: ItemId, attempts: u32, retry_at: i64 },
    Abandoned { item_id: ItemId, attempts: u32 },
    /// Item was removed (e.g. queue cleared) while its send was in flight
    Vanished { item_id: ItemId },
}

/// Releases the in-flight flag on every exit path of a tick
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Drains the queue one item at a time through the Transport
pub struct Dispatcher {
    store: Arc<QueueStore>,
    transport: Arc<dyn Transport>,
    notifier: Arc<dyn Notifier>,
    time_provider: Arc<dyn TimeProvider>,
    retry_policy: RetryPolicy,
    tick_interval: Duration,
    paused: AtomicBool,
    in_flight: AtomicBool,
}

impl Dispatcher {
    pub fn new(
        store: Arc<QueueStore>,
        transport: Arc<dyn Transport>,
        notifier: Arc<dyn Notifier>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            store,
            transport,
            notifier,
            time_provider,
            retry_policy: RetryPolicy::default(),
            tick_interval: TICK_INTERVAL,
            paused: AtomicBool::new(false),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Override the timer period (tests and embedders)
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// True while a tick holds the in-flight flag
    pub fn is_sending(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Flip the pause flag. Returns the new state.
    ///
    /// Only gates future ticks; a send already in flight runs to completion.
    pub fn toggle_pause(&self) -> bool {
        let paused = !self.paused.fetch_xor(true, Ordering::AcqRel);
        if paused {
            info!("Queue paused");
            self.notifier.notify("Queue paused", Severity::Info);
        } else {
            info!("Queue resumed");
            self.notifier.notify("Queue resumed", Severity::Success);
        }
        paused
    }

    /// Run the timer loop until shutdown is requested.
    ///
    /// A tick in progress (including its transport call) is never interrupted;
    /// shutdown is observed between ticks.
    pub async fn run(&self, mut shutdown: ShutdownToken) {
        info!(tick_ms = self.tick_interval.as_millis() as u64, "Dispatcher started");
        loop {
            if shutdown.is_shutdown() {
                info!("Dispatcher shutting down");
                break;
            }

            let outcome = self.tick().await;
            debug!(outcome = ?outcome, "Tick finished");

            tokio::select! {
                _ = sleep(self.tick_interval) => {},
                _ = shutdown.wait() => {
                    info!("Dispatcher interrupted while idle");
                    break;
                }
            }
        }
        info!("Dispatcher stopped");
    }

    /// One pass of the drain loop: claim the oldest pending item, wait out the
    /// pacing delay, transmit, then record the outcome.
    pub async fn tick(&self) -> TickOutcome {
        if self.is_paused() {
            return TickOutcome::Paused;
        }

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            debug!("Tick skipped: send already in flight");
            return TickOutcome::Busy;
        };

        let settings = self.store.settings().await;
        if !settings.auto_send {
            return TickOutcome::AutoSendOff;
        }

        self.store
            .promote_due_retries(self.time_provider.now_millis())
            .await;

        let item = match self.store.claim_next(&self.retry_policy).await {
            Some(Claim::Ready(item)) => item,
            Some(Claim::Exhausted(item)) => return self.abandon(item),
            None => return TickOutcome::Idle,
        };

        if settings.delay_ms > 0 {
            sleep(Duration::from_millis(settings.delay_ms)).await;
        }

        info!(
            item_id = %item.id,
            destination = %item.destination,
            attempt = item.attempts,
            "Sending queued message"
        );

        match self.transmit(&item).await {
            Ok(()) => self.on_sent(item).await,
            Err(e) => self.on_failed(item, e).await,
        }
    }

    async fn transmit(&self, item: &QueueItem) -> Result<(), TransportError> {
        item.payload
            .validate()
            .map_err(|e| TransportError::InvalidPayload(e.to_string()))?;

        let transport = Arc::clone(&self.transport);
        let destination = item.destination.clone();
        let payload = item.payload.clone();

        send_guarded(async move { transport.send(&destination, &payload).await }).await
    }

    async fn on_sent(&self, item: QueueItem) -> TickOutcome {
        if !self.store.remove(&item.id).await {
            warn!(item_id = %item.id, "Sent item was already gone from the queue");
        }

        let queue_len = self.store.len().await;
        info!(
            item_id = %item.id,
            destination = %item.destination,
            attempts = item.attempts,
            queue_len = queue_len,
            "Message sent"
        );

        if self.store.settings().await.show_notifications {
            self.notifier.notify(
                &format!("Message sent to {}", item.destination),
                Severity::Success,
            );
        }

        TickOutcome::Sent { item_id: item.id }
    }

    async fn on_failed(&self, item: QueueItem, err: TransportError) -> TickOutcome {
        let reason = err.to_string();
        warn!(
            item_id = %item.id,
            attempt = item.attempts,
            error = %reason,
            "Send attempt failed"
        );

        let now = self.time_provider.now_millis();
        match self
            .store
            .record_failure(&item.id, &reason, now, &self.retry_policy)
            .await
        {
            FailureOutcome::Retrying { item, retry_at } => TickOutcome::Retrying {
                item_id: item.id,
                attempts: item.attempts,
                retry_at,
            },
            FailureOutcome::Abandoned { item } => self.abandon(item),
            FailureOutcome::Missing => TickOutcome::Vanished { item_id: item.id },
        }
    }

    fn abandon(&self, item: QueueItem) -> TickOutcome {
        error!(
            item_id = %item.id,
            attempts = item.attempts,
            last_error = ?item.last_error,
            "Message abandoned"
        );
        self.notifier.notify(
            &format!("Failed to send message after {} attempts", item.attempts),
            Severity::Failure,
        );
        TickOutcome::Abandoned {
            item_id: item.id,
            attempts: item.attempts,
        }
    }
}
