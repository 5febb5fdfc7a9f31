//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, client identity)
//!     → security (CSRF, rate limits)
//!     → api handlers
//!     → response.rs (error bodies)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{client_identifier, MakeRequestUuidV4, X_REQUEST_ID};
pub use response::ApiError;
pub use server::HttpServer;
