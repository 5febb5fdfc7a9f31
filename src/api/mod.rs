//! Public JSON API.
//!
//! # Routes
//! ```text
//! GET  /health               no limiter
//! GET  /api/csrf-token       api limiter
//! GET  /api/products         api limiter
//! GET  /api/products/{id}    api limiter
//! GET  /api/search?q=        search limiter
//! POST /api/compare          compare limiter
//! ```
//!
//! Limiters are attached with `route_layer`, so unmatched paths are never
//! counted against a client.

pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::catalog::Catalog;
use crate::config::RateLimitSettings;
use crate::security::rate_limit::{rate_limit_middleware, RateLimitConfigError, RateLimiter};
use self::handlers::*;

#[derive(Clone)]
pub struct ApiState {
    pub catalog: Arc<Catalog>,
}

/// One limiter per route group. Stores are never shared between groups.
#[derive(Debug, Clone)]
pub struct RouteLimiters {
    pub api: Arc<RateLimiter>,
    pub search: Arc<RateLimiter>,
    pub compare: Arc<RateLimiter>,
}

impl RouteLimiters {
    pub fn from_settings(settings: &RateLimitSettings) -> Result<Self, RateLimitConfigError> {
        Ok(Self {
            api: Arc::new(RateLimiter::new(settings.api)?.named("api")),
            search: Arc::new(RateLimiter::new(settings.search)?.named("search")),
            compare: Arc::new(RateLimiter::new(settings.compare)?.named("compare")),
        })
    }

    pub fn all(&self) -> [&Arc<RateLimiter>; 3] {
        [&self.api, &self.search, &self.compare]
    }
}

pub fn setup_api_router(state: ApiState, limiters: Option<&RouteLimiters>) -> Router {
    let general = Router::new()
        .route("/api/csrf-token", get(csrf_token))
        .route("/api/products", get(list_products))
        .route("/api/products/{id}", get(get_product));
    let search_routes = Router::new().route("/api/search", get(search));
    let compare_routes = Router::new().route("/api/compare", post(compare));

    Router::new()
        .route("/health", get(health))
        .merge(limited(general, limiters.map(|l| &l.api)))
        .merge(limited(search_routes, limiters.map(|l| &l.search)))
        .merge(limited(compare_routes, limiters.map(|l| &l.compare)))
        .with_state(state)
}

fn limited(router: Router<ApiState>, limiter: Option<&Arc<RateLimiter>>) -> Router<ApiState> {
    match limiter {
        Some(limiter) => router.route_layer(middleware::from_fn_with_state(
            limiter.clone(),
            rate_limit_middleware,
        )),
        None => router,
    }
}
