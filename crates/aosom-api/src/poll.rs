// Fixed-interval polling with a hard deadline.
//
// Used by the reachability probe, blueprint build waits, and approved-pool
// updates. No backoff: every wait is the same interval, trimmed so the
// last wait never overshoots the deadline.

use std::time::Duration;

use tokio::time::{Instant, sleep};

/// Interval between attempts for every bounded poll in the crate.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
pub(crate) struct FixedPoll {
    deadline: Instant,
    interval: Duration,
}

impl FixedPoll {
    pub(crate) fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
            interval,
        }
    }

    /// Wait before the next attempt. Returns `false` once the deadline has
    /// passed, meaning the caller should stop.
    pub(crate) async fn tick(&self) -> bool {
        let now = Instant::now();
        if now >= self.deadline {
            return false;
        }
        sleep(self.interval.min(self.deadline - now)).await;
        true
    }
}
