//! Cookie construction and extraction for auth and CSRF tokens.

use axum::http::{
    header::{InvalidHeaderValue, AUTHORIZATION, COOKIE},
    HeaderMap, HeaderValue,
};

use super::state::AuthConfig;

pub const JWT_COOKIE_NAME: &str = "jwtCookie";
pub const CSRF_COOKIE_NAME: &str = "XSRF-TOKEN";
pub const CSRF_HEADER_NAME: &str = "x-xsrf-token";

/// Build the `HttpOnly` cookie carrying the JWT.
pub fn auth_cookie(config: &AuthConfig, token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    build_cookie(config, JWT_COOKIE_NAME, token, true)
}

/// Build the CSRF cookie. Not `HttpOnly`: the frontend reads it back and
/// echoes it in the `X-XSRF-TOKEN` header (double submit).
pub fn csrf_cookie(config: &AuthConfig, token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    build_cookie(config, CSRF_COOKIE_NAME, token, false)
}

fn build_cookie(
    config: &AuthConfig,
    name: &str,
    value: &str,
    http_only: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = config.cookie_ttl_seconds();
    let mut cookie = format!("{name}={value}; Path=/; SameSite=Lax; Max-Age={ttl_seconds}");
    if http_only {
        cookie.push_str("; HttpOnly");
    }
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Expire a cookie by name. Used by logout for both auth and CSRF cookies.
pub fn clear_cookie(
    config: &AuthConfig,
    name: &str,
    http_only: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{name}=; Path=/; SameSite=Lax; Max-Age=0");
    if http_only {
        cookie.push_str("; HttpOnly");
    }
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Read a cookie value by name from the request headers.
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == name {
            return Some(val.to_string());
        }
    }
    None
}

/// Resolve the JWT for a request: `Authorization: Bearer` wins, then the
/// auth cookie.
pub fn extract_auth_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    extract_cookie(headers, JWT_COOKIE_NAME)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn config(url: &str) -> AuthConfig {
        AuthConfig::new(url.to_string(), SecretString::from("s3cret".to_string()))
    }

    #[test]
    fn auth_cookie_is_http_only() {
        let cookie = auth_cookie(&config("https://handshakr.dev"), "tok").expect("cookie");
        let value = cookie.to_str().expect("ascii");
        assert!(value.starts_with("jwtCookie=tok;"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("Secure"));
    }

    #[test]
    fn csrf_cookie_is_readable_by_scripts() {
        let cookie = csrf_cookie(&config("http://localhost:3000"), "tok").expect("cookie");
        let value = cookie.to_str().expect("ascii");
        assert!(value.starts_with("XSRF-TOKEN=tok;"));
        assert!(!value.contains("HttpOnly"));
        assert!(!value.contains("Secure"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie =
            clear_cookie(&config("https://handshakr.dev"), JWT_COOKIE_NAME, true).expect("cookie");
        assert!(cookie.to_str().expect("ascii").contains("Max-Age=0"));
    }

    #[test]
    fn extract_cookie_by_name() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("other=1; jwtCookie=abc.def.ghi; XSRF-TOKEN=xyz"),
        );
        assert_eq!(
            extract_cookie(&headers, JWT_COOKIE_NAME),
            Some("abc.def.ghi".to_string())
        );
        assert_eq!(
            extract_cookie(&headers, CSRF_COOKIE_NAME),
            Some("xyz".to_string())
        );
        assert_eq!(extract_cookie(&headers, "missing"), None);
    }

    #[test]
    fn bearer_token_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("jwtCookie=from-cookie"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(extract_auth_token(&headers), Some("from-header".to_string()));
    }

    #[test]
    fn empty_bearer_falls_back_to_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("jwtCookie=from-cookie"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_auth_token(&headers), Some("from-cookie".to_string()));
    }
}
