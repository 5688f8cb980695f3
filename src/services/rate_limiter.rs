use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Pinboard allows one API call every three seconds per account.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(3);

/// Process-wide gate spacing outbound calls at least `min_interval` apart.
///
/// Waiters are admitted in arrival order: tokio's mutex is fair, and the lock is
/// held while sleeping so a later caller cannot overtake an earlier one.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
    acquisitions: AtomicU64,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
            acquisitions: AtomicU64::new(0),
        }
    }

    /// Limiter that never waits, for tests and local fakes.
    pub fn unthrottled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Number of permits handed out so far.
    pub fn acquisitions(&self) -> u64 {
        self.acquisitions.load(Ordering::Relaxed)
    }

    /// Waits until the next outbound call may be made. Call exactly once,
    /// immediately before each request.
    pub async fn acquire(&self) {
        let mut last_call = self.last_call.lock().await;

        if let Some(previous) = *last_call {
            let ready_at = previous + self.min_interval;
            if ready_at > Instant::now() {
                debug!(
                    "Rate limiting: waiting {:.2}s before next upstream call",
                    (ready_at - Instant::now()).as_secs_f64()
                );
                sleep_until(ready_at).await;
            }
        }

        *last_call = Some(Instant::now());
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}
