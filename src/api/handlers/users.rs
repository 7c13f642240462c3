//! Authenticated user endpoints: listing, self-service, and public keys.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::ToSchema;

use crate::{
    api::{error::ServiceError, response::ApiResponse},
    auth::{require_auth, state::AuthConfig},
    user::{repo, UserDto},
};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SetPublicKeyRequest {
    pub public_key: String,
}

#[utoipa::path(
    get,
    path = "/v1/users",
    responses(
        (status = 200, description = "All registered usernames", body = [String]),
        (status = 401, description = "Missing or invalid token"),
    ),
    tag = "users"
)]
pub async fn list_users(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
) -> impl IntoResponse {
    if let Err(err) = require_auth(&headers, &config) {
        return err.into_response();
    }

    match repo::fetch_usernames(&pool).await {
        Ok(usernames) => (
            StatusCode::OK,
            Json(ApiResponse::success("Users retrieved successfully", usernames)),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to retrieve user list: {err:?}");
            ServiceError::ServiceUnavailable("Failed to retrieve user list".to_string())
                .into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/users/me",
    responses(
        (status = 200, description = "Details of the authenticated user", body = UserDto),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User no longer exists"),
    ),
    tag = "users"
)]
pub async fn me(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &config) {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    match repo::find_by_username(&pool, &principal.username).await {
        Ok(Some(user)) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                "User details retrieved",
                UserDto::from(&user),
            )),
        )
            .into_response(),
        Ok(None) => user_not_found(&principal.username).into_response(),
        Err(err) => ServiceError::Internal(err).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/v1/users/me/public-key",
    responses(
        (status = 200, description = "Public key of the authenticated user", body = String),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User no longer exists"),
    ),
    tag = "users"
)]
pub async fn get_public_key(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &config) {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    match repo::find_by_username(&pool, &principal.username).await {
        Ok(Some(user)) => (
            StatusCode::OK,
            Json(ApiResponse::success("Public key retrieved", user.public_key)),
        )
            .into_response(),
        Ok(None) => user_not_found(&principal.username).into_response(),
        Err(err) => ServiceError::Internal(err).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/users/me/public-key",
    request_body = SetPublicKeyRequest,
    responses(
        (status = 200, description = "Public key updated"),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User no longer exists"),
    ),
    tag = "users"
)]
#[instrument(skip_all)]
pub async fn set_public_key(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    payload: Option<Json<SetPublicKeyRequest>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &config) {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    let request: SetPublicKeyRequest = match payload {
        Some(Json(payload)) => payload,
        None => return ServiceError::bad_request("Missing payload").into_response(),
    };

    let public_key = request.public_key.trim();
    if public_key.is_empty() {
        return ServiceError::bad_request("Public key cannot be empty").into_response();
    }

    match repo::update_public_key(&pool, &principal.username, public_key).await {
        Ok(true) => (
            StatusCode::OK,
            Json(ApiResponse::ok("Public key updated successfully")),
        )
            .into_response(),
        Ok(false) => user_not_found(&principal.username).into_response(),
        Err(err) => ServiceError::Internal(err).into_response(),
    }
}

fn user_not_found(username: &str) -> ServiceError {
    ServiceError::not_found(format!("User '{username}' not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{cookie::JWT_COOKIE_NAME, jwt};
    use axum::http::{header::COOKIE, HeaderValue};
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;

    fn test_config() -> Arc<AuthConfig> {
        Arc::new(AuthConfig::new(
            "https://handshakr.dev".to_string(),
            SecretString::from("0123456789abcdef0123456789abcdef".to_string()),
        ))
    }

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool")
    }

    fn authed_headers(config: &AuthConfig) -> HeaderMap {
        let token = jwt::generate_token("alice", config.jwt_secret(), 600).expect("token");
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("{JWT_COOKIE_NAME}={token}")).expect("header"),
        );
        headers
    }

    #[tokio::test]
    async fn list_users_requires_auth() {
        let response = list_users(
            HeaderMap::new(),
            Extension(lazy_pool()),
            Extension(test_config()),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn me_requires_auth() {
        let response = me(
            HeaderMap::new(),
            Extension(lazy_pool()),
            Extension(test_config()),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn set_public_key_missing_payload() {
        let config = test_config();
        let response = set_public_key(
            authed_headers(&config),
            Extension(lazy_pool()),
            Extension(config.clone()),
            None,
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn set_public_key_rejects_blank_key() {
        let config = test_config();
        let payload = Json(SetPublicKeyRequest {
            public_key: "   ".to_string(),
        });
        let response = set_public_key(
            authed_headers(&config),
            Extension(lazy_pool()),
            Extension(config.clone()),
            Some(payload),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
