//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the rate limiters and CSRF guard from configuration
//! - Create the Axum router with all handlers
//! - Wire up middleware (tracing, request ID, timeout, CSRF)
//! - Run the server until shutdown, sweeping limiter stores meanwhile

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, middleware, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::api::{setup_api_router, ApiState, RouteLimiters};
use crate::catalog::Catalog;
use crate::config::validation::validate_config;
use crate::config::{ConfigError, ServerConfig};
use crate::http::request::{MakeRequestUuidV4, X_REQUEST_ID};
use crate::security::csrf::{csrf_middleware, CsrfGuard};

/// HTTP server for the API.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
    limiters: Option<RouteLimiters>,
}

impl HttpServer {
    /// Create a new HTTP server serving the built-in catalog.
    pub fn new(config: ServerConfig) -> Result<Self, ConfigError> {
        Self::with_catalog(config, Catalog::seeded())
    }

    /// Create a new HTTP server over `catalog`.
    ///
    /// Fails if `config` does not pass validation.
    pub fn with_catalog(config: ServerConfig, catalog: Catalog) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let limiters = if config.rate_limit.enabled {
            Some(RouteLimiters::from_settings(&config.rate_limit)?)
        } else {
            tracing::warn!("Rate limiting disabled");
            None
        };

        let state = ApiState {
            catalog: Arc::new(catalog),
        };
        let router = Self::build_router(&config, state, limiters.as_ref());

        Ok(Self {
            router,
            config,
            limiters,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers run outermost first: request ID, tracing, timeout, CSRF, then
    /// the per-route limiters inside the API router.
    fn build_router(config: &ServerConfig, state: ApiState, limiters: Option<&RouteLimiters>) -> Router {
        Self::with_middleware(setup_api_router(state, limiters), config)
    }

    fn with_middleware(router: Router, config: &ServerConfig) -> Router {
        let guard = Arc::new(CsrfGuard::new(config.csrf.clone()));

        router
            .layer(middleware::from_fn_with_state(guard, csrf_middleware))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(config.timeouts.request_secs),
            ))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
    }

    /// The fully layered router, for driving the service without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn limiters(&self) -> Option<&RouteLimiters> {
        self.limiters.as_ref()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        if let Some(limiters) = &self.limiters {
            let interval = Duration::from_secs(self.config.rate_limit.sweep_interval_secs);
            for limiter in limiters.all() {
                limiter.start(interval).map_err(std::io::Error::other)?;
            }
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        if let Some(limiters) = &self.limiters {
            for limiter in limiters.all() {
                limiter.stop();
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
