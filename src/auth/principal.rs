//! Authenticated principal extraction.
//!
//! Resolve the request's JWT (bearer header or auth cookie) into a principal
//! downstream handlers can act on. No server-side session store: the token
//! itself is the session.

use axum::http::HeaderMap;

use crate::api::error::ServiceError;

use super::{cookie::extract_auth_token, jwt, state::AuthConfig};

/// Authenticated user context derived from the JWT.
#[derive(Clone, Debug)]
pub struct Principal {
    pub username: String,
}

/// Resolve the request's token into a principal, or fail with 401.
pub fn require_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<Principal, ServiceError> {
    let Some(token) = extract_auth_token(headers) else {
        return Err(ServiceError::Unauthorized);
    };

    let claims =
        jwt::decode_claims(&token, config.jwt_secret()).map_err(|_| ServiceError::Unauthorized)?;

    if claims.sub.trim().is_empty() {
        return Err(ServiceError::Unauthorized);
    }

    Ok(Principal {
        username: claims.sub,
    })
}
