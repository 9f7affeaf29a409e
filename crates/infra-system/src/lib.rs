// Sendq Infrastructure - System Adapters
// Implements: Transport (command, HTTP, dry-run), Notifier + NotificationFeed

pub mod command_transport;
pub mod feed_notifier;
pub mod http_transport;
pub mod log_transport;

pub use command_transport::CommandTransport;
pub use feed_notifier::{FeedNotifier, DEFAULT_FEED_CAPACITY};
pub use http_transport::HttpTransport;
pub use log_transport::LogTransport;
