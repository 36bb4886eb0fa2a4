//! Fixed-window request counting per client key.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Outcome of a single [`RateLimiter::check`].
///
/// Carries everything needed for the `RateLimit-*` response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the current window resets.
    pub reset_after: Duration,
}

impl RateDecision {
    /// Whole seconds until reset, rounded up so clients never retry early.
    pub fn reset_secs(&self) -> u64 {
        let secs = self.reset_after.as_secs();
        if self.reset_after.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RateWindow {
    count: u32,
    started: Instant,
}

/// Process-wide table of request windows keyed by client address.
///
/// The increment-and-compare runs under a single mutex that is never held
/// across an await, so concurrent requests from one client can't overshoot
/// the limit.
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    windows: Mutex<HashMap<String, RateWindow>>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Counts one request for `key` and decides whether it may proceed.
    pub fn check(&self, key: &str) -> RateDecision {
        let now = Instant::now();
        let mut windows = self.windows.lock();

        let entry = windows.entry(key.to_string()).or_insert(RateWindow {
            count: 0,
            started: now,
        });

        if now.duration_since(entry.started) >= self.window {
            *entry = RateWindow {
                count: 0,
                started: now,
            };
        }

        entry.count = entry.count.saturating_add(1);

        let allowed = entry.count <= self.limit;
        let reset_after = (entry.started + self.window).saturating_duration_since(now);

        if !allowed {
            tracing::debug!(client = key, count = entry.count, "Rate limit exceeded");
        }

        RateDecision {
            allowed,
            limit: self.limit,
            remaining: self.limit.saturating_sub(entry.count),
            reset_after,
        }
    }

    /// Reports the current window for `key` without counting a request.
    ///
    /// `allowed` tells whether one more request would still be admitted.
    pub fn peek(&self, key: &str) -> RateDecision {
        let now = Instant::now();
        let windows = self.windows.lock();

        match windows.get(key) {
            Some(w) if now.duration_since(w.started) < self.window => RateDecision {
                allowed: w.count < self.limit,
                limit: self.limit,
                remaining: self.limit.saturating_sub(w.count),
                reset_after: (w.started + self.window).saturating_duration_since(now),
            },
            _ => RateDecision {
                allowed: true,
                limit: self.limit,
                remaining: self.limit,
                reset_after: self.window,
            },
        }
    }

    /// Drops windows that have fully elapsed. Returns how many were removed.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.windows.lock();
        let before = windows.len();
        windows.retain(|_, w| now.duration_since(w.started) < self.window);
        before - windows.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.lock().len()
    }

    /// Spawns a background task that calls [`Self::evict_expired`] every `every`.
    pub fn spawn_sweeper(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let evicted = self.evict_expired();
                if evicted > 0 {
                    tracing::debug!(
                        evicted,
                        remaining = self.tracked_clients(),
                        "Evicted expired rate windows"
                    );
                }
            }
        })
    }
}
