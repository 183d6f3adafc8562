use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// Process-wide request pacing gate.
///
/// One instance is created at client construction and shared by every clone
/// of the client. `acquire` reserves the next send slot under the lock, so
/// concurrent callers observe a monotonically advancing baseline: dispatches
/// are spaced at least `interval` apart, in reservation order. The sleep
/// itself happens outside the lock.
pub(crate) struct Throttle {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Throttle {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Waits until this caller's reserved send slot has arrived.
    pub(crate) async fn acquire(&self) {
        let wait = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next_slot {
                Some(earliest) if earliest > now => earliest,
                _ => now,
            };
            *next_slot = Some(slot + self.interval);
            slot.saturating_duration_since(now)
        };

        if !wait.is_zero() {
            #[cfg(feature = "tracing")]
            tracing::debug!("throttling request for {} ms", wait.as_millis());
            sleep(wait).await;
        }
    }
}
