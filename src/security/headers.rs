//! Rate limit response headers.
//!
//! Projects a [`RateLimitDecision`] onto the conventional `X-RateLimit-*`
//! headers, plus `Retry-After` on rejection. Pure formatting; calling it twice
//! with the same decision yields the same map.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::security::rate_limit::RateLimitDecision;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Build the response headers describing `decision`.
pub fn rate_limit_headers(decision: &RateLimitDecision) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(4);

    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit()));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining()));

    if let Some(reset) = format_reset(decision.reset_time()) {
        headers.insert(X_RATELIMIT_RESET, reset);
    }

    if let Some(retry_after) = decision.retry_after() {
        headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    }

    headers
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-05-01T12:00:00.000Z`.
fn format_reset(reset_ms: i64) -> Option<HeaderValue> {
    let reset = DateTime::<Utc>::from_timestamp_millis(reset_ms)?;
    HeaderValue::from_str(&reset.to_rfc3339_opts(SecondsFormat::Millis, true)).ok()
}
