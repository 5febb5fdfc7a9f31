//! Request identification.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for tracing
//! - Derive a stable client identifier for rate limiting
//!
//! # Design Decisions
//! - Request ID added as early as possible so every log line carries it
//! - Client identity prefers proxy headers, then the socket peer address

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{HeaderName, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Identifier used when nothing about the client is known.
pub const ANONYMOUS_CLIENT: &str = "anonymous";

/// Generates `x-request-id` values.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Rate limiting key for `request`.
///
/// First `X-Forwarded-For` entry, else `X-Real-IP`, else the peer IP, else
/// [`ANONYMOUS_CLIENT`].
pub fn client_identifier<B>(request: &Request<B>) -> String {
    let headers = request.headers();

    let forwarded = headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    let real_ip = headers
        .get(X_REAL_IP)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = real_ip {
        return ip.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| ANONYMOUS_CLIENT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_forwarded_for_wins() {
        let req = Request::builder()
            .header("x-forwarded-for", " 198.51.100.4 , 10.0.0.1")
            .header("x-real-ip", "10.0.0.2")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_identifier(&req), "198.51.100.4");
    }

    #[test]
    fn test_real_ip_fallback() {
        let req = Request::builder()
            .header("x-forwarded-for", "")
            .header("x-real-ip", "10.0.0.2")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_identifier(&req), "10.0.0.2");
    }

    #[test]
    fn test_peer_address_fallback() {
        let mut req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_identifier(&req), ANONYMOUS_CLIENT);

        let peer: SocketAddr = "192.0.2.9:51000".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(peer));
        assert_eq!(client_identifier(&req), "192.0.2.9");
    }

    #[test]
    fn test_request_ids_are_unique() {
        let req = Request::builder().body(()).unwrap();
        let mut maker = MakeRequestUuidV4;
        let a = maker.make_request_id(&req).unwrap();
        let b = maker.make_request_id(&req).unwrap();
        assert_ne!(a.header_value(), b.header_value());
        assert_eq!(a.header_value().len(), 36);
    }
}
