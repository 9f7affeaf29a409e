// Notifier Port - operator-facing toasts, fire-and-forget

use serde::{Deserialize, Serialize};

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Failure,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Success => write!(f, "success"),
            Severity::Failure => write!(f, "failure"),
        }
    }
}

/// Notifier interface. Must not block: rendering is the presenter's concern.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// One delivered notification, as kept by a feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEntry {
    /// Monotonic, starts at 1
    pub seq: u64,
    pub message: String,
    pub severity: Severity,
    pub at: i64, // epoch ms
}

/// Read side of a buffering notifier, polled by presenters
pub trait NotificationFeed: Send + Sync {
    /// Entries with `seq > after_seq` (all retained entries when `None`), oldest first
    fn list(&self, after_seq: Option<u64>) -> Vec<NotificationEntry>;
}

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Records every notification for assertions
    #[derive(Default)]
    pub struct RecordingNotifier {
        entries: Mutex<Vec<(String, Severity)>>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn entries(&self) -> Vec<(String, Severity)> {
            self.entries.lock().unwrap().clone()
        }

        pub fn count(&self, severity: Severity) -> usize {
            self.entries
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, s)| *s == severity)
                .count()
        }

        pub fn contains(&self, needle: &str) -> bool {
            self.entries
                .lock()
                .unwrap()
                .iter()
                .any(|(m, _)| m.contains(needle))
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, message: &str, severity: Severity) {
            self.entries
                .lock()
                .unwrap()
                .push((message.to_string(), severity));
        }
    }
}
