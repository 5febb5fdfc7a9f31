//! Fixed-window rate limiting.
//!
//! Each [`RateLimiter`] owns its own store of per-identifier records. A record
//! counts requests until its window expires; the next request after expiry
//! starts a fresh window. Expired records are dropped lazily on the next check
//! for that identifier, or in bulk by the background sweeper.
//!
//! # Design Decisions
//! - Store is a `DashMap`; the read-check-increment runs under the entry lock
//! - Rejected checks never increment the count
//! - Time comes from a [`Clock`] so windows can be driven in tests

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::request::client_identifier;
use crate::http::response::ApiError;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::security::headers::rate_limit_headers;

/// Source of the current time, in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync + 'static {
    fn now_ms(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start_ms)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let ms = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Window length and request ceiling for one limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Window duration in milliseconds.
    pub window_ms: u64,

    /// Maximum requests admitted per window.
    pub max_requests: u32,
}

impl RateLimitConfig {
    pub const fn new(window_ms: u64, max_requests: u32) -> Self {
        Self {
            window_ms,
            max_requests,
        }
    }

    /// General API traffic: 100 requests per minute.
    pub const fn api() -> Self {
        Self::new(60_000, 100)
    }

    /// Search: 30 requests per minute.
    pub const fn search() -> Self {
        Self::new(60_000, 30)
    }

    /// Product comparison: 20 requests per minute.
    pub const fn compare() -> Self {
        Self::new(60_000, 20)
    }

    pub fn validate(&self) -> Result<(), RateLimitConfigError> {
        if self.window_ms == 0 {
            return Err(RateLimitConfigError::ZeroWindow);
        }
        if self.max_requests == 0 {
            return Err(RateLimitConfigError::ZeroMaxRequests);
        }
        Ok(())
    }

    fn window_ms_i64(&self) -> i64 {
        i64::try_from(self.window_ms).unwrap_or(i64::MAX)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::api()
    }
}

/// Invalid limiter configuration, reported at construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateLimitConfigError {
    #[error("rate limit window must be greater than zero")]
    ZeroWindow,

    #[error("rate limit max_requests must be greater than zero")]
    ZeroMaxRequests,

    #[error("rate limit sweep interval must be greater than zero")]
    ZeroSweepInterval,
}

/// Outcome of a single [`RateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed {
        remaining: u32,
        limit: u32,
        /// Window end, epoch milliseconds.
        reset_time: i64,
    },
    Rejected {
        /// Whole seconds until the window ends.
        retry_after: u64,
        limit: u32,
        /// Window end, epoch milliseconds.
        reset_time: i64,
    },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }

    pub fn remaining(&self) -> u32 {
        match self {
            RateLimitDecision::Allowed { remaining, .. } => *remaining,
            RateLimitDecision::Rejected { .. } => 0,
        }
    }

    pub fn limit(&self) -> u32 {
        match self {
            RateLimitDecision::Allowed { limit, .. } | RateLimitDecision::Rejected { limit, .. } => {
                *limit
            }
        }
    }

    pub fn reset_time(&self) -> i64 {
        match self {
            RateLimitDecision::Allowed { reset_time, .. }
            | RateLimitDecision::Rejected { reset_time, .. } => *reset_time,
        }
    }

    pub fn retry_after(&self) -> Option<u64> {
        match self {
            RateLimitDecision::Allowed { .. } => None,
            RateLimitDecision::Rejected { retry_after, .. } => Some(*retry_after),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RateLimitRecord {
    count: u32,
    reset_time: i64,
}

struct Store {
    records: DashMap<String, RateLimitRecord>,
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
}

impl Store {
    fn check(&self, identifier: &str) -> RateLimitDecision {
        let now = self.clock.now_ms();
        let limit = self.config.max_requests;
        let fresh = RateLimitRecord {
            count: 1,
            reset_time: now.saturating_add(self.config.window_ms_i64()),
        };
        let allowed_fresh = RateLimitDecision::Allowed {
            remaining: limit - 1,
            limit,
            reset_time: fresh.reset_time,
        };

        match self.records.entry(identifier.to_owned()) {
            Entry::Vacant(slot) => {
                slot.insert(fresh);
                allowed_fresh
            }
            Entry::Occupied(mut slot) => {
                let record = slot.get_mut();
                if now > record.reset_time {
                    *record = fresh;
                    allowed_fresh
                } else if record.count < limit {
                    record.count += 1;
                    RateLimitDecision::Allowed {
                        remaining: limit - record.count,
                        limit,
                        reset_time: record.reset_time,
                    }
                } else {
                    RateLimitDecision::Rejected {
                        retry_after: retry_after_secs(record.reset_time, now),
                        limit,
                        reset_time: record.reset_time,
                    }
                }
            }
        }
    }

    fn sweep(&self) -> usize {
        let now = self.clock.now_ms();
        let mut evicted = 0;
        self.records.retain(|_, record| {
            let keep = now <= record.reset_time;
            if !keep {
                evicted += 1;
            }
            keep
        });
        evicted
    }
}

/// `ceil((reset_time - now) / 1000)`, never negative.
fn retry_after_secs(reset_time: i64, now: i64) -> u64 {
    let remaining_ms = reset_time.saturating_sub(now).max(0) as u64;
    remaining_ms.div_ceil(1000)
}

/// A fixed-window rate limiter with its own record store.
pub struct RateLimiter {
    name: String,
    store: Arc<Store>,
    sweeper: Mutex<Option<Shutdown>>,
}

impl RateLimiter {
    /// Create a limiter using wall-clock time.
    pub fn new(config: RateLimitConfig) -> Result<Self, RateLimitConfigError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a limiter reading time from `clock`.
    pub fn with_clock(
        config: RateLimitConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, RateLimitConfigError> {
        config.validate()?;
        Ok(Self {
            name: "default".to_string(),
            store: Arc::new(Store {
                records: DashMap::new(),
                config,
                clock,
            }),
            sweeper: Mutex::new(None),
        })
    }

    /// Set the name used in logs and metric labels.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> RateLimitConfig {
        self.store.config
    }

    /// Count a request from `identifier` and decide whether it may proceed.
    pub fn check(&self, identifier: &str) -> RateLimitDecision {
        self.store.check(identifier)
    }

    /// Drop every record whose window has ended. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let evicted = self.store.sweep();
        metrics::record_rate_limit_sweep(&self.name, evicted, self.store.records.len());
        evicted
    }

    /// Number of identifiers currently tracked.
    pub fn len(&self) -> usize {
        self.store.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.records.is_empty()
    }

    /// Start sweeping expired records every `interval`.
    ///
    /// Must be called from within a Tokio runtime. Does nothing if the
    /// sweeper is already running.
    pub fn start(&self, interval: Duration) -> Result<(), RateLimitConfigError> {
        if interval.is_zero() {
            return Err(RateLimitConfigError::ZeroSweepInterval);
        }

        let mut sweeper = self.sweeper.lock().expect("rate limiter sweeper mutex poisoned");
        if sweeper.is_some() {
            return Ok(());
        }

        let shutdown = Shutdown::new();
        let mut stop = shutdown.subscribe();
        let store = Arc::downgrade(&self.store);
        let name = self.name.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if !sweep_once(&store, &name) {
                            break;
                        }
                    }
                    _ = stop.recv() => break,
                }
            }
            tracing::debug!(limiter = %name, "Rate limit sweeper stopped");
        });

        tracing::debug!(limiter = %self.name, interval = ?interval, "Rate limit sweeper started");
        *sweeper = Some(shutdown);
        Ok(())
    }

    /// Stop the background sweeper, if running.
    pub fn stop(&self) {
        let mut sweeper = self.sweeper.lock().expect("rate limiter sweeper mutex poisoned");
        if let Some(shutdown) = sweeper.take() {
            shutdown.trigger();
        }
    }

    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .expect("rate limiter sweeper mutex poisoned")
            .is_some()
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        if let Ok(mut sweeper) = self.sweeper.lock() {
            if let Some(shutdown) = sweeper.take() {
                shutdown.trigger();
            }
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("name", &self.name)
            .field("config", &self.store.config)
            .field("tracked", &self.store.records.len())
            .finish()
    }
}

/// Returns false once the limiter has been dropped.
fn sweep_once(store: &Weak<Store>, name: &str) -> bool {
    let Some(store) = store.upgrade() else {
        return false;
    };
    let evicted = store.sweep();
    if evicted > 0 {
        tracing::debug!(limiter = %name, evicted, "Swept expired rate limit records");
    }
    metrics::record_rate_limit_sweep(name, evicted, store.records.len());
    true
}

/// Middleware enforcing a [`RateLimiter`] on the wrapped routes.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let identifier = client_identifier(&request);
    let decision = limiter.check(&identifier);
    let headers = rate_limit_headers(&decision);

    let mut response = match decision {
        RateLimitDecision::Allowed { .. } => next.run(request).await,
        RateLimitDecision::Rejected { retry_after, .. } => {
            tracing::warn!(
                limiter = %limiter.name(),
                client = %identifier,
                retry_after,
                "Rate limit exceeded"
            );
            metrics::record_rate_limited(limiter.name());
            ApiError::TooManyRequests { retry_after }.into_response()
        }
    };

    response.headers_mut().extend(headers);
    response
}
