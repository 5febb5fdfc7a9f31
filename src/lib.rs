//! AR glasses storefront API.
//!
//! Read-only catalog endpoints behind two guards: a double-submit cookie
//! CSRF check and per-route fixed-window rate limiters.

pub mod api;
pub mod catalog;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
