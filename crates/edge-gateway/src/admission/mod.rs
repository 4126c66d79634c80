//! Admission control: fixed-window rate limiting.
//!
//! Each identity gets two counters, a minute window and an hour window,
//! keyed by the window's start timestamp. Both counters are incremented
//! before either limit is evaluated, so a rejected request still counts —
//! hammering a limit does not extend the window for free.
//!
//! Counter storage sits behind [`CounterStore`] so the same limiter runs
//! against process-local shards or a shared Redis. A store failure degrades
//! per the policy: fail-open admits (and flags the admission as degraded),
//! fail-closed turns the failure into a 500.

pub mod local;
pub mod redis;

use crate::config::RateLimitPolicy;
use crate::errors::GatewayError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub use local::LocalCounterStore;
pub use redis::RedisCounterStore;

/// Rate-limit window granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateWindow {
    Minute,
    Hour,
}

impl RateWindow {
    /// Window length in seconds.
    #[must_use]
    pub fn seconds(self) -> i64 {
        match self {
            RateWindow::Minute => 60,
            RateWindow::Hour => 3600,
        }
    }

    /// Label for logs and metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RateWindow::Minute => "minute",
            RateWindow::Hour => "hour",
        }
    }
}

impl fmt::Display for RateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counter store failure. The limiter maps this to the policy's degradation
/// mode; it never surfaces raw store errors to clients.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("counter store call timed out")]
    Timeout,

    #[error("counter store backend error: {0}")]
    Backend(String),
}

/// Storage seam for window counters.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically increment `key`, setting `ttl_seconds` on first touch.
    /// Returns the post-increment count.
    async fn increment(&self, key: &str, ttl_seconds: i64) -> Result<u64, StoreError>;
}

/// Outcome of a successful admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// True when the counter store failed and the policy admitted anyway.
    pub degraded: bool,
}

/// Counter key: identity scoped to a window instance.
#[must_use]
pub fn bucket_key(identity: &str, window: RateWindow, window_start: i64) -> String {
    format!("gw:rl:{}:{}:{}", identity, window.as_str(), window_start)
}

/// Fixed-window rate limiter over a pluggable counter store.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        RateLimiter { store }
    }

    /// Admit or reject a request for `identity` under `policy`, using the
    /// current time.
    ///
    /// # Errors
    ///
    /// - `GatewayError::RateLimited` when a window ceiling is breached
    /// - `GatewayError::Internal` when the store fails and the policy is
    ///   fail-closed
    pub async fn check(
        &self,
        identity: &str,
        policy: &RateLimitPolicy,
    ) -> Result<Admission, GatewayError> {
        self.check_at(identity, policy, chrono::Utc::now().timestamp())
            .await
    }

    /// Admission check with an explicit `now` for deterministic tests.
    ///
    /// # Errors
    ///
    /// See [`RateLimiter::check`].
    pub async fn check_at(
        &self,
        identity: &str,
        policy: &RateLimitPolicy,
        now: i64,
    ) -> Result<Admission, GatewayError> {
        let minute = self.bump(identity, RateWindow::Minute, now).await;
        let hour = self.bump(identity, RateWindow::Hour, now).await;

        let (minute_count, hour_count) = match (minute, hour) {
            (Ok(m), Ok(h)) => (m, h),
            (Err(e), _) | (_, Err(e)) => {
                return if policy.fail_open {
                    tracing::warn!(
                        target: "gw.admission",
                        error = %e,
                        "Counter store unavailable, admitting request (fail-open)"
                    );
                    Ok(Admission { degraded: true })
                } else {
                    tracing::error!(
                        target: "gw.admission",
                        error = %e,
                        "Counter store unavailable, rejecting request (fail-closed)"
                    );
                    Err(GatewayError::Internal)
                };
            }
        };

        // The minute window is reported first when both ceilings are
        // breached; its retry hint is the shorter one.
        if minute_count > policy.per_minute {
            return Err(GatewayError::RateLimited {
                window: RateWindow::Minute,
                retry_after_secs: retry_after(RateWindow::Minute, now),
            });
        }
        if hour_count > policy.per_hour {
            return Err(GatewayError::RateLimited {
                window: RateWindow::Hour,
                retry_after_secs: retry_after(RateWindow::Hour, now),
            });
        }

        Ok(Admission { degraded: false })
    }

    async fn bump(
        &self,
        identity: &str,
        window: RateWindow,
        now: i64,
    ) -> Result<u64, StoreError> {
        let window_start = now - now.rem_euclid(window.seconds());
        let key = bucket_key(identity, window, window_start);
        self.store.increment(&key, window.seconds()).await
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter").finish_non_exhaustive()
    }
}

/// Seconds until the current window instance rolls over.
fn retry_after(window: RateWindow, now: i64) -> i64 {
    window.seconds() - now.rem_euclid(window.seconds())
}
