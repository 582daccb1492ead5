//! Cooperative process-wide rate limiter for outbound SERP requests
//!
//! Two constraints, enforced together under one lock: a minimum spacing
//! between requests sharing an endpoint key, and a rolling ceiling on
//! requests across all keys in the trailing hour. The limiter never rejects
//! a call — it suspends the calling task until proceeding is safe, so
//! callers must tolerate latencies of tens of seconds under load.
//!
//! The clock is injectable so tests can drive the window without real
//! sleeps. There is no cross-process coordination; each process enforces
//! its own independent budget.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Length of the rolling request window
const WINDOW: Duration = Duration::from_secs(3600);

/// Time source for the limiter; swapped for a mock in tests
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

/// Wall-clock implementation backed by tokio timers
#[derive(Debug, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Mutable limiter state, only ever touched under the limiter's lock
#[derive(Debug, Default)]
struct RateWindow {
    /// Last request instant per endpoint key
    last_by_key: HashMap<String, Instant>,
    /// Request instants within the trailing hour, oldest first, all keys
    window: VecDeque<Instant>,
}

impl RateWindow {
    fn prune(&mut self, now: Instant) {
        while let Some(oldest) = self.window.front() {
            if now.duration_since(*oldest) >= WINDOW {
                self.window.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Cooperative throttle shared by every acquisition strategy
pub struct RateLimiter {
    clock: Arc<dyn Clock>,
    state: Mutex<RateWindow>,
    min_spacing: Duration,
    hourly_ceiling: usize,
}

impl RateLimiter {
    /// Create a limiter with the given spacing floor and hourly ceiling
    #[must_use]
    pub fn new(min_spacing: Duration, hourly_ceiling: usize) -> Self {
        Self::with_clock(min_spacing, hourly_ceiling, Arc::new(TokioClock))
    }

    /// Create a limiter with an injected clock (tests)
    #[must_use]
    pub fn with_clock(
        min_spacing: Duration,
        hourly_ceiling: usize,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            clock,
            state: Mutex::new(RateWindow::default()),
            min_spacing,
            hourly_ceiling: hourly_ceiling.max(1),
        }
    }

    /// Block (suspend) until a request tagged with `endpoint_key` may
    /// proceed, then record it.
    ///
    /// The timestamp is recorded before returning, so a caller that is
    /// cancelled after `acquire` resolves cannot desynchronize the budget.
    /// The lock is held across waits deliberately: concurrent callers queue
    /// on the mutex instead of racing the window.
    pub async fn acquire(&self, endpoint_key: &str) {
        let mut state = self.state.lock().await;

        loop {
            let now = self.clock.now();
            state.prune(now);

            // Hourly ceiling across all keys
            if state.window.len() >= self.hourly_ceiling {
                if let Some(oldest) = state.window.front().copied() {
                    let wait = WINDOW - now.duration_since(oldest);
                    info!(
                        endpoint_key,
                        wait_secs = wait.as_secs(),
                        "hourly request ceiling reached, waiting"
                    );
                    self.clock.sleep(wait).await;
                    continue;
                }
            }

            // Minimum spacing per endpoint key
            if let Some(last) = state.last_by_key.get(endpoint_key).copied() {
                let elapsed = now.duration_since(last);
                if elapsed < self.min_spacing {
                    let wait = self.min_spacing - elapsed;
                    debug!(
                        endpoint_key,
                        wait_millis = wait.as_millis() as u64,
                        "spacing floor not met, waiting"
                    );
                    self.clock.sleep(wait).await;
                    continue;
                }
            }

            let now = self.clock.now();
            state.last_by_key.insert(endpoint_key.to_string(), now);
            state.window.push_back(now);
            return;
        }
    }

    /// Requests currently counted in the trailing hour
    pub async fn window_len(&self) -> usize {
        let mut state = self.state.lock().await;
        let now = self.clock.now();
        state.prune(now);
        state.window.len()
    }
}
