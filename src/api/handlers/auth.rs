//! Registration, login, and logout.
//!
//! Login issues the JWT cookie plus the CSRF cookie; logout clears both.
//! All outcomes use the standard response envelope.

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;

use crate::{
    api::{error::ServiceError, response::ApiResponse},
    auth::{cookie, csrf, jwt, password, state::AuthConfig},
    user::repo::{self, RegisterOutcome},
};

use super::{normalize_email, normalize_username, valid_email};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful"),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Username or email already exists"),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn register(
    pool: Extension<PgPool>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let request: RegisterRequest = match payload {
        Some(Json(payload)) => payload,
        None => return ServiceError::bad_request("Missing payload").into_response(),
    };

    let username = normalize_username(&request.username);
    let email = normalize_email(&request.email);

    if username.is_empty() {
        return ServiceError::bad_request("Username cannot be empty").into_response();
    }

    if !valid_email(&email) {
        return ServiceError::bad_request("Invalid email").into_response();
    }

    if request.password.len() < password::MIN_PASSWORD_LENGTH {
        return ServiceError::bad_request("Password must be at least 8 characters long")
            .into_response();
    }

    // Pre-checks give precise messages; the unique constraints still win races.
    match repo::username_exists(&pool, &username).await {
        Ok(true) => {
            return ServiceError::conflict(format!("Username '{username}' is already taken"))
                .into_response();
        }
        Ok(false) => (),
        Err(err) => return ServiceError::Internal(err).into_response(),
    }

    match repo::email_exists(&pool, &email).await {
        Ok(true) => {
            return ServiceError::conflict(format!("Email '{email}' is already registered"))
                .into_response();
        }
        Ok(false) => (),
        Err(err) => return ServiceError::Internal(err).into_response(),
    }

    let password_hash = match password::hash_password(&request.password) {
        Ok(hash) => hash,
        Err(err) => return ServiceError::Internal(err).into_response(),
    };

    match repo::insert_user(&pool, &username, &email, &password_hash).await {
        Ok(RegisterOutcome::Created) => {
            debug!(%username, "User registered");
            let status = StatusCode::CREATED;
            (
                status,
                Json(ApiResponse::success_with_status(
                    "User registered successfully",
                    status.as_u16(),
                    (),
                )),
            )
                .into_response()
        }
        Ok(RegisterOutcome::Conflict) => {
            ServiceError::conflict(format!("Username '{username}' is already taken"))
                .into_response()
        }
        Err(err) => ServiceError::Internal(err).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, JWT and CSRF cookies set", body = String),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account disabled or locked"),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return ServiceError::bad_request("Missing payload").into_response(),
    };

    let username = normalize_username(&request.username);
    if username.is_empty() || request.password.is_empty() {
        return ServiceError::bad_request("Username and password are required").into_response();
    }

    let user = match repo::find_by_username(&pool, &username).await {
        Ok(Some(user)) => user,
        // Unknown user and bad password are indistinguishable on the wire.
        Ok(None) => return ServiceError::Unauthorized.into_response(),
        Err(err) => return ServiceError::Internal(err).into_response(),
    };

    if !password::verify_password(&request.password, &user.password_hash) {
        return ServiceError::Unauthorized.into_response();
    }

    if !user.enabled {
        return ServiceError::Forbidden("Account is disabled".to_string()).into_response();
    }

    if user.locked {
        return ServiceError::Forbidden("Account is locked".to_string()).into_response();
    }

    let token = match jwt::generate_token(
        &user.username,
        config.jwt_secret(),
        config.jwt_ttl_seconds(),
    ) {
        Ok(token) => token,
        Err(err) => return ServiceError::Internal(err).into_response(),
    };

    let csrf_token = match csrf::generate_csrf_token() {
        Ok(token) => token,
        Err(err) => return ServiceError::Internal(err).into_response(),
    };

    let mut response_headers = HeaderMap::new();
    match (
        cookie::auth_cookie(&config, &token),
        cookie::csrf_cookie(&config, &csrf_token),
    ) {
        (Ok(auth_cookie), Ok(csrf_cookie)) => {
            response_headers.append(SET_COOKIE, auth_cookie);
            response_headers.append(SET_COOKIE, csrf_cookie);
        }
        _ => {
            error!("Failed to build session cookies");
            return ServiceError::Internal(anyhow::anyhow!("invalid cookie value"))
                .into_response();
        }
    }

    if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
        response_headers.insert(AUTHORIZATION, value);
    }

    (
        StatusCode::OK,
        response_headers,
        Json(ApiResponse::success("Login successful", token)),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 200, description = "Logout successful, cookies cleared"),
    ),
    tag = "auth"
)]
pub async fn logout(config: Extension<Arc<AuthConfig>>) -> impl IntoResponse {
    // Always clear both cookies, even without an active session.
    let mut response_headers = HeaderMap::new();
    if let Ok(value) = cookie::clear_cookie(&config, cookie::JWT_COOKIE_NAME, true) {
        response_headers.append(SET_COOKIE, value);
    }
    if let Ok(value) = cookie::clear_cookie(&config, cookie::CSRF_COOKIE_NAME, false) {
        response_headers.append(SET_COOKIE, value);
    }

    (
        StatusCode::OK,
        response_headers,
        Json(ApiResponse::ok("Logout successful")),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
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

    #[tokio::test]
    async fn register_missing_payload() {
        let response = register(Extension(lazy_pool()), None).await.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_rejects_short_password() {
        let payload = Json(RegisterRequest {
            email: "alice@example.com".to_string(),
            username: "alice".to_string(),
            password: "short".to_string(),
        });
        let response = register(Extension(lazy_pool()), Some(payload))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_rejects_invalid_email() {
        let payload = Json(RegisterRequest {
            email: "not-an-email".to_string(),
            username: "alice".to_string(),
            password: "long enough password".to_string(),
        });
        let response = register(Extension(lazy_pool()), Some(payload))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_missing_payload() {
        let response = login(Extension(lazy_pool()), Extension(test_config()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_rejects_blank_credentials() {
        let payload = Json(LoginRequest {
            username: "  ".to_string(),
            password: "password".to_string(),
        });
        let response = login(Extension(lazy_pool()), Extension(test_config()), Some(payload))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn logout_clears_both_cookies() {
        let response = logout(Extension(test_config())).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let cookies: Vec<_> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|value| value.to_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().any(|c| c.starts_with("jwtCookie=;")));
        assert!(cookies.iter().any(|c| c.starts_with("XSRF-TOKEN=;")));
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
    }
}
