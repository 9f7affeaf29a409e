// Feed notifier - keeps recent notifications for presenters to poll

use sendq_core::port::{NotificationEntry, NotificationFeed, Notifier, Severity, TimeProvider};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

/// Entries retained by default
pub const DEFAULT_FEED_CAPACITY: usize = 100;

struct Feed {
    next_seq: u64,
    entries: VecDeque<NotificationEntry>,
}

/// Bounded ring of notifications. Also logs every entry through `tracing`.
pub struct FeedNotifier {
    feed: Mutex<Feed>,
    capacity: usize,
    time_provider: Arc<dyn TimeProvider>,
}

impl FeedNotifier {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self::with_capacity(time_provider, DEFAULT_FEED_CAPACITY)
    }

    pub fn with_capacity(time_provider: Arc<dyn TimeProvider>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            feed: Mutex::new(Feed {
                next_seq: 1,
                entries: VecDeque::with_capacity(capacity),
            }),
            capacity,
            time_provider,
        }
    }

    // A panic while holding the lock cannot leave the ring inconsistent.
    fn lock(&self) -> MutexGuard<'_, Feed> {
        self.feed.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Notifier for FeedNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Failure => warn!(severity = %severity, "{}", message),
            _ => info!(severity = %severity, "{}", message),
        }

        let at = self.time_provider.now_millis();
        let mut feed = self.lock();
        let seq = feed.next_seq;
        feed.next_seq += 1;

        if feed.entries.len() == self.capacity {
            feed.entries.pop_front();
        }
        feed.entries.push_back(NotificationEntry {
            seq,
            message: message.to_string(),
            severity,
            at,
        });
    }
}

impl NotificationFeed for FeedNotifier {
    fn list(&self, after_seq: Option<u64>) -> Vec<NotificationEntry> {
        let after = after_seq.unwrap_or(0);
        self.lock()
            .entries
            .iter()
            .filter(|e| e.seq > after)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sendq_core::port::time_provider::mocks::ManualTimeProvider;

    #[test]
    fn test_entries_are_sequenced() {
        let clock = Arc::new(ManualTimeProvider::new(100));
        let feed = FeedNotifier::new(clock.clone());

        feed.notify("Queued! (1 total)", Severity::Success);
        clock.advance(5);
        feed.notify("Queue paused", Severity::Info);

        let entries = feed.list(None);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].seq, 1);
        assert_eq!(entries[1].seq, 2);
        assert_eq!(entries[1].at, 105);

        let newer = feed.list(Some(1));
        assert_eq!(newer.len(), 1);
        assert_eq!(newer[0].message, "Queue paused");
    }

    #[test]
    fn test_ring_drops_oldest() {
        let feed = FeedNotifier::with_capacity(Arc::new(ManualTimeProvider::new(0)), 3);
        for n in 0..5 {
            feed.notify(&format!("n{}", n), Severity::Info);
        }

        let seqs: Vec<_> = feed.list(None).into_iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![3, 4, 5]);
    }

    #[test]
    fn test_default_capacity_is_one_hundred() {
        let feed = FeedNotifier::new(Arc::new(ManualTimeProvider::new(0)));
        for n in 0..150 {
            feed.notify(&format!("n{}", n), Severity::Info);
        }
        let entries = feed.list(None);
        assert_eq!(entries.len(), DEFAULT_FEED_CAPACITY);
        assert_eq!(entries[0].seq, 51);
    }
}
