//! Double-submit cookie CSRF protection.
//!
//! Safe requests (GET, HEAD, OPTIONS) always pass; if they arrive without a
//! `csrf-token` cookie a fresh token is minted and set on the response.
//! Every other method must echo the cookie value in the `x-csrf-token` header.
//!
//! The token is not bound to a user or session and carries no expiry beyond
//! the cookie's max-age. Anything able to read the cookie (e.g. injected
//! script) can forge the header.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::http::response::ApiError;
use crate::observability::metrics;

pub const CSRF_COOKIE_NAME: &str = "csrf-token";
pub const CSRF_HEADER_NAME: &str = "x-csrf-token";
pub const CSRF_ERROR: &str = "Invalid or missing CSRF token";

const TOKEN_BYTES: usize = 32;

/// CSRF guard settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CsrfConfig {
    /// Enforce tokens on unsafe methods.
    pub enabled: bool,

    /// Add the `Secure` attribute to the token cookie (production).
    pub secure_cookies: bool,

    /// Cookie lifetime in seconds.
    pub max_age_secs: u64,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            secure_cookies: false,
            max_age_secs: 24 * 60 * 60,
        }
    }
}

/// The token in effect for a safe request, available to handlers as an
/// extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken(pub String);

/// Result of inspecting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrfOutcome {
    SafeMethod,
    TokenMissing,
    TokenMismatch,
    TokenValid,
}

impl CsrfOutcome {
    pub fn is_allowed(self) -> bool {
        matches!(self, CsrfOutcome::SafeMethod | CsrfOutcome::TokenValid)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CsrfOutcome::SafeMethod => "safe_method",
            CsrfOutcome::TokenMissing => "token_missing",
            CsrfOutcome::TokenMismatch => "token_mismatch",
            CsrfOutcome::TokenValid => "token_valid",
        }
    }
}

/// 32 bytes from the OS CSPRNG as 64 lowercase hex characters.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn is_safe_method(method: &Method) -> bool {
    method == Method::GET || method == Method::HEAD || method == Method::OPTIONS
}

/// Value of the `csrf-token` cookie, if present and non-empty.
pub fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| name.trim() == CSRF_COOKIE_NAME)
        .map(|(_, value)| unquote(value.trim()).to_string())
        .filter(|value| !value.is_empty())
}

/// Cookie values may be wrapped in one pair of double quotes.
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
}

/// Value of the `x-csrf-token` header, if present and non-empty.
pub fn header_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(CSRF_HEADER_NAME)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

pub fn evaluate(method: &Method, headers: &HeaderMap) -> CsrfOutcome {
    if is_safe_method(method) {
        return CsrfOutcome::SafeMethod;
    }

    match (cookie_token(headers), header_token(headers)) {
        (Some(cookie), Some(header)) => {
            if bool::from(cookie.as_bytes().ct_eq(header.as_bytes())) {
                CsrfOutcome::TokenValid
            } else {
                CsrfOutcome::TokenMismatch
            }
        }
        _ => CsrfOutcome::TokenMissing,
    }
}

/// True if the request is a safe method or carries matching tokens.
pub fn verify(method: &Method, headers: &HeaderMap) -> bool {
    evaluate(method, headers).is_allowed()
}

/// Issues and validates double-submit tokens.
#[derive(Debug, Clone, Default)]
pub struct CsrfGuard {
    config: CsrfConfig,
}

impl CsrfGuard {
    pub fn new(config: CsrfConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CsrfConfig {
        &self.config
    }

    /// `Set-Cookie` value carrying `token`.
    pub fn set_cookie(&self, token: &str) -> Result<HeaderValue, header::InvalidHeaderValue> {
        let mut cookie = format!(
            "{CSRF_COOKIE_NAME}={token}; Path=/; Max-Age={}; HttpOnly; SameSite=Strict",
            self.config.max_age_secs
        );
        if self.config.secure_cookies {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie)
    }
}

/// Middleware applying the double-submit check to every request.
pub async fn csrf_middleware(
    State(guard): State<Arc<CsrfGuard>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if !guard.config.enabled {
        return next.run(request).await;
    }

    let outcome = evaluate(request.method(), request.headers());
    match outcome {
        CsrfOutcome::SafeMethod => {
            let (token, minted) = match cookie_token(request.headers()) {
                Some(existing) => (existing, false),
                None => (generate_token(), true),
            };
            request.extensions_mut().insert(CsrfToken(token.clone()));

            let mut response = next.run(request).await;
            if minted {
                match guard.set_cookie(&token) {
                    Ok(cookie) => {
                        response.headers_mut().append(header::SET_COOKIE, cookie);
                        metrics::record_csrf_token_issued();
                    }
                    Err(e) => tracing::error!(error = %e, "Failed to build CSRF cookie"),
                }
            }
            response
        }
        CsrfOutcome::TokenValid => next.run(request).await,
        CsrfOutcome::TokenMissing | CsrfOutcome::TokenMismatch => {
            tracing::warn!(
                method = %request.method(),
                path = %request.uri().path(),
                reason = outcome.as_str(),
                "CSRF validation failed"
            );
            metrics::record_csrf_rejected(outcome.as_str());
            ApiError::InvalidCsrfToken.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::StatusCode,
        middleware,
        routing::{get, post},
        Extension, Router,
    };
    use tower::ServiceExt;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    fn app(config: CsrfConfig) -> Router {
        Router::new()
            .route(
                "/",
                get(|Extension(token): Extension<CsrfToken>| async move { token.0 }),
            )
            .route("/submit", post(|| async { "accepted" }))
            .layer(middleware::from_fn_with_state(
                Arc::new(CsrfGuard::new(config)),
                csrf_middleware,
            ))
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_token_format() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
        assert_ne!(a, b);
    }

    #[test]
    fn test_cookie_parsing() {
        let map = headers(&[("cookie", "theme=dark; csrf-token=abc123 ; other=1")]);
        assert_eq!(cookie_token(&map).as_deref(), Some("abc123"));

        let split = headers(&[("cookie", "theme=dark"), ("cookie", "csrf-token=xyz")]);
        assert_eq!(cookie_token(&split).as_deref(), Some("xyz"));

        let empty = headers(&[("cookie", "csrf-token=")]);
        assert_eq!(cookie_token(&empty), None);

        let prefixed = headers(&[("cookie", "my-csrf-token=nope")]);
        assert_eq!(cookie_token(&prefixed), None);

        let quoted = headers(&[("cookie", "csrf-token=\"abc123\"")]);
        assert_eq!(cookie_token(&quoted).as_deref(), Some("abc123"));

        let quoted_empty = headers(&[("cookie", "csrf-token=\"\"")]);
        assert_eq!(cookie_token(&quoted_empty), None);

        let lone_quote = headers(&[("cookie", "csrf-token=\"abc")]);
        assert_eq!(cookie_token(&lone_quote).as_deref(), Some("\"abc"));
    }

    #[test]
    fn test_quoted_cookie_matches_unquoted_header() {
        let token = generate_token();
        let cookie = format!("csrf-token=\"{token}\"");
        let map = headers(&[("cookie", cookie.as_str()), ("x-csrf-token", token.as_str())]);
        assert_eq!(evaluate(&Method::POST, &map), CsrfOutcome::TokenValid);
    }

    #[test]
    fn test_state_machine() {
        let token = generate_token();
        let cookie = format!("csrf-token={token}");

        for method in [Method::GET, Method::HEAD, Method::OPTIONS] {
            assert_eq!(evaluate(&method, &HeaderMap::new()), CsrfOutcome::SafeMethod);
        }

        let none = HeaderMap::new();
        let header_only = headers(&[("x-csrf-token", token.as_str())]);
        let cookie_only = headers(&[("cookie", cookie.as_str())]);
        let mismatch = headers(&[("cookie", cookie.as_str()), ("x-csrf-token", "wrong")]);
        let valid = headers(&[("cookie", cookie.as_str()), ("x-csrf-token", token.as_str())]);

        assert_eq!(evaluate(&Method::POST, &none), CsrfOutcome::TokenMissing);
        assert_eq!(evaluate(&Method::PUT, &header_only), CsrfOutcome::TokenMissing);
        assert_eq!(evaluate(&Method::DELETE, &cookie_only), CsrfOutcome::TokenMissing);
        assert_eq!(evaluate(&Method::POST, &mismatch), CsrfOutcome::TokenMismatch);
        assert_eq!(evaluate(&Method::PATCH, &valid), CsrfOutcome::TokenValid);

        assert!(verify(&Method::GET, &none));
        assert!(verify(&Method::POST, &valid));
        assert!(!verify(&Method::POST, &mismatch));
    }

    #[test]
    fn test_set_cookie_attributes() {
        let dev = CsrfGuard::new(CsrfConfig::default()).set_cookie("t").unwrap();
        assert_eq!(
            dev,
            "csrf-token=t; Path=/; Max-Age=86400; HttpOnly; SameSite=Strict"
        );

        let prod = CsrfGuard::new(CsrfConfig {
            secure_cookies: true,
            ..CsrfConfig::default()
        })
        .set_cookie("t")
        .unwrap();
        assert!(prod.to_str().unwrap().ends_with("; Secure"));
    }

    #[tokio::test]
    async fn test_get_mints_cookie_once() {
        let app = app(CsrfConfig::default());

        let first = app
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        let set_cookie = first.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        let token = set_cookie
            .strip_prefix("csrf-token=")
            .and_then(|rest| rest.split(';').next())
            .unwrap()
            .to_string();
        assert_eq!(token.len(), 64);
        // Handler sees the same token it is about to receive as a cookie.
        assert_eq!(body_string(first).await, token);

        let repeat = app
            .oneshot(
                Request::get("/")
                    .header("cookie", format!("csrf-token={token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(repeat.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(body_string(repeat).await, token);
    }

    #[tokio::test]
    async fn test_post_validation() {
        let app = app(CsrfConfig::default());
        let token = generate_token();
        let post = |cookie: Option<&str>, header: Option<&str>| {
            let mut builder = Request::post("/submit");
            if let Some(cookie) = cookie {
                builder = builder.header("cookie", format!("csrf-token={cookie}"));
            }
            if let Some(header) = header {
                builder = builder.header("x-csrf-token", header);
            }
            builder.body(Body::empty()).unwrap()
        };

        let ok = app.clone().oneshot(post(Some(token.as_str()), Some(token.as_str()))).await.unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(body_string(ok).await, "accepted");

        for request in [
            post(Some(token.as_str()), None),
            post(None, Some(token.as_str())),
            post(Some(token.as_str()), Some("wrong")),
        ] {
            let rejected = app.clone().oneshot(request).await.unwrap();
            assert_eq!(rejected.status(), StatusCode::FORBIDDEN);
            assert_eq!(
                body_string(rejected).await,
                r#"{"error":"Invalid or missing CSRF token"}"#
            );
        }
    }

    #[tokio::test]
    async fn test_disabled_guard_passes_everything() {
        let app = Router::new()
            .route("/submit", post(|| async { "accepted" }))
            .layer(middleware::from_fn_with_state(
                Arc::new(CsrfGuard::new(CsrfConfig {
                    enabled: false,
                    ..CsrfConfig::default()
                })),
                csrf_middleware,
            ));

        let response = app
            .oneshot(Request::post("/submit").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
