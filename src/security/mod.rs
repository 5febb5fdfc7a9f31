//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → csrf.rs (double-submit token check; mint cookie on safe methods)
//!     → rate_limit.rs (per-route fixed-window limits)
//!     → handler
//!     → headers.rs (X-RateLimit-* on the way out)
//! ```
//!
//! # Design Decisions
//! - Rejections are responses (403, 429), never errors to the caller
//! - Each guard short-circuits; the handler does not run on rejection
//! - No trust in client input beyond using it as a map key

pub mod csrf;
pub mod headers;
pub mod rate_limit;

pub use csrf::{CsrfConfig, CsrfGuard, CsrfOutcome, CsrfToken};
pub use headers::rate_limit_headers;
pub use rate_limit::{Clock, ManualClock, RateLimitConfig, RateLimitDecision, RateLimiter, SystemClock};
