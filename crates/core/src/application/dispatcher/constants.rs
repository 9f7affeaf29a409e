// Dispatcher constants (no magic values)
use std::time::Duration;

/// Period of the driving timer
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Attempt ceiling; the item is abandoned once this many attempts failed
pub const MAX_SEND_ATTEMPTS: u32 = 3;
