//! Double-submit CSRF protection.
//!
//! Login issues a random token in the `XSRF-TOKEN` cookie; mutating requests
//! must echo it back in the `X-XSRF-TOKEN` header. Registration and login are
//! exempt since no token exists before a session is established.

use anyhow::{Context, Result};
use axum::{
    extract::Request,
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::Engine;
use rand::{rngs::OsRng, RngCore};
use tracing::warn;

use crate::api::response::ApiResponse;

use super::cookie::{extract_cookie, CSRF_COOKIE_NAME, CSRF_HEADER_NAME};

const EXEMPT_PATHS: [&str; 2] = ["/v1/auth/register", "/v1/auth/login"];

/// Create a new CSRF token. The raw value goes to the cookie and is compared
/// verbatim against the request header.
pub fn generate_csrf_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate csrf token")?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// Middleware enforcing the double-submit check on mutating methods.
pub async fn enforce(request: Request, next: Next) -> Response {
    if requires_check(request.method(), request.uri().path()) {
        let cookie = extract_cookie(request.headers(), CSRF_COOKIE_NAME);
        let header = request
            .headers()
            .get(CSRF_HEADER_NAME)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        if !tokens_match(cookie.as_deref(), header.as_deref()) {
            warn!(
                path = request.uri().path(),
                "Rejected request with missing or mismatched CSRF token"
            );
            let status = StatusCode::FORBIDDEN;
            return (
                status,
                Json(ApiResponse::<()>::error("Invalid CSRF token", status.as_u16())),
            )
                .into_response();
        }
    }

    next.run(request).await
}

fn requires_check(method: &Method, path: &str) -> bool {
    let mutating = matches!(
        *method,
        Method::POST | Method::PUT | Method::DELETE | Method::PATCH
    );
    mutating && !EXEMPT_PATHS.contains(&path)
}

fn tokens_match(cookie: Option<&str>, header: Option<&str>) -> bool {
    match (cookie, header) {
        (Some(cookie), Some(header)) => !cookie.is_empty() && cookie == header,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    #[test]
    fn generated_tokens_are_random_and_decodable() {
        let first = generate_csrf_token().expect("token");
        let second = generate_csrf_token().expect("token");
        assert_ne!(first, second);
        assert_eq!(
            URL_SAFE_NO_PAD.decode(first.as_bytes()).map(|b| b.len()),
            Ok(32)
        );
    }

    #[test]
    fn mutating_methods_require_check() {
        assert!(requires_check(&Method::POST, "/v1/handshakes"));
        assert!(requires_check(&Method::PUT, "/v1/handshakes/pact/accept"));
        assert!(requires_check(&Method::POST, "/v1/auth/logout"));
        assert!(!requires_check(&Method::GET, "/v1/handshakes/pact"));
        assert!(!requires_check(&Method::OPTIONS, "/v1/handshakes"));
    }

    #[test]
    fn register_and_login_are_exempt() {
        assert!(!requires_check(&Method::POST, "/v1/auth/register"));
        assert!(!requires_check(&Method::POST, "/v1/auth/login"));
    }

    #[test]
    fn tokens_must_be_present_and_equal() {
        assert!(tokens_match(Some("tok"), Some("tok")));
        assert!(!tokens_match(Some("tok"), Some("other")));
        assert!(!tokens_match(Some("tok"), None));
        assert!(!tokens_match(None, Some("tok")));
        assert!(!tokens_match(Some(""), Some("")));
    }
}
