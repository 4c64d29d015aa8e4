// Delay-based rate limiter for validator API calls.
//
// The validator backend enforces a throughput ceiling, so consecutive
// calls keep a minimum spacing. If a call arrives before the spacing has
// elapsed we sleep out the remainder - a fixed, short delay, not a true
// suspension point: cancelling a run just stops issuing further batches.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Enforces a minimum delay between consecutive calls.
#[derive(Clone)]
pub struct RateLimiter {
    min_delay: Duration,
    last_call: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    /// Create a limiter with an explicit minimum spacing between calls.
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_call: Arc::new(Mutex::new(None)),
        }
    }

    /// Convenience constructor from a requests-per-second budget.
    pub fn per_second(requests_per_second: f64) -> Self {
        Self::new(Duration::from_secs_f64(1.0 / requests_per_second))
    }

    /// Wait until the next call is allowed, then record it.
    ///
    /// Returns immediately when the minimum delay has already elapsed.
    pub async fn acquire(&self) {
        let mut last = self.last_call.lock().await;

        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_delay {
                let remaining = self.min_delay - elapsed;
                // Release the lock while sleeping so other tasks can queue.
                drop(last);
                tokio::time::sleep(remaining).await;
                last = self.last_call.lock().await;
            }
        }

        *last = Some(Instant::now());
    }
}
