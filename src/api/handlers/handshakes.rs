//! Handshake lifecycle endpoints.
//!
//! Creation validates both participants and the unique name; status changes
//! go through the transition table and land with a compare-and-set update.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
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
    auth::{require_auth, state::AuthConfig, Principal},
    handshake::{
        repo::{self, CreateOutcome, UpdateOutcome},
        HandshakeDto, HandshakeStatus,
    },
    user::repo as user_repo,
};

use super::normalize_username;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateHandshakeRequest {
    pub handshake_name: String,
    pub encrypted_details: Option<String>,
    pub acceptor_username: String,
}

#[utoipa::path(
    post,
    path = "/v1/handshakes",
    request_body = CreateHandshakeRequest,
    responses(
        (status = 201, description = "Handshake created", body = HandshakeDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Participant does not exist"),
        (status = 409, description = "Handshake name already exists"),
    ),
    tag = "handshakes"
)]
#[instrument(skip_all)]
pub async fn create(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
    payload: Option<Json<CreateHandshakeRequest>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &config) {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    let request: CreateHandshakeRequest = match payload {
        Some(Json(payload)) => payload,
        None => return ServiceError::bad_request("Missing payload").into_response(),
    };

    match create_handshake(&pool, &principal, request).await {
        Ok(dto) => {
            let status = StatusCode::CREATED;
            (
                status,
                Json(ApiResponse::success_with_status(
                    "Handshake created successfully",
                    status.as_u16(),
                    dto,
                )),
            )
                .into_response()
        }
        Err(err) => err.into_response(),
    }
}

async fn create_handshake(
    pool: &PgPool,
    principal: &Principal,
    request: CreateHandshakeRequest,
) -> Result<HandshakeDto, ServiceError> {
    let handshake_name = request.handshake_name.trim().to_string();
    if handshake_name.is_empty() {
        return Err(ServiceError::bad_request("Handshake name cannot be empty"));
    }

    let acceptor_username = normalize_username(&request.acceptor_username);
    if acceptor_username.is_empty() {
        return Err(ServiceError::bad_request("Acceptor username cannot be empty"));
    }

    // Both participants must exist before anything is written.
    let initiator = user_repo::find_by_username(pool, &principal.username)
        .await
        .map_err(ServiceError::Internal)?
        .ok_or_else(|| user_not_found(&principal.username))?;

    let acceptor = user_repo::find_by_username(pool, &acceptor_username)
        .await
        .map_err(ServiceError::Internal)?
        .ok_or_else(|| user_not_found(&acceptor_username))?;

    if repo::exists_by_name(pool, &handshake_name)
        .await
        .map_err(ServiceError::Internal)?
    {
        return Err(handshake_name_taken(&handshake_name));
    }

    let outcome = repo::insert(
        pool,
        &handshake_name,
        request.encrypted_details.as_deref(),
        initiator.id,
        &initiator.username,
        acceptor.id,
        &acceptor.username,
    )
    .await
    .map_err(ServiceError::Internal)?;

    if let CreateOutcome::Conflict = outcome {
        return Err(handshake_name_taken(&handshake_name));
    }

    debug!(%handshake_name, "Handshake created");

    let record = repo::find_by_name(pool, &handshake_name)
        .await
        .map_err(ServiceError::Internal)?
        .ok_or_else(|| handshake_not_found(&handshake_name))?;

    Ok(HandshakeDto::from(record))
}

#[utoipa::path(
    get,
    path = "/v1/handshakes/{name}",
    params(("name" = String, Path, description = "Handshake name")),
    responses(
        (status = 200, description = "Handshake retrieved", body = HandshakeDto),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Handshake not found"),
    ),
    tag = "handshakes"
)]
pub async fn get_by_name(
    Path(name): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
) -> impl IntoResponse {
    if let Err(err) = require_auth(&headers, &config) {
        return err.into_response();
    }

    match repo::find_by_name(&pool, name.trim()).await {
        Ok(Some(record)) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                "Handshake retrieved",
                HandshakeDto::from(record),
            )),
        )
            .into_response(),
        Ok(None) => handshake_not_found(name.trim()).into_response(),
        Err(err) => retrieval_failed(&err).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/v1/handshakes/by-initiator/{username}",
    params(("username" = String, Path, description = "Initiator username")),
    responses(
        (status = 200, description = "Most recent handshake initiated by the user", body = HandshakeDto),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "No handshake found"),
    ),
    tag = "handshakes"
)]
pub async fn latest_by_initiator(
    Path(username): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
) -> impl IntoResponse {
    if let Err(err) = require_auth(&headers, &config) {
        return err.into_response();
    }

    let username = normalize_username(&username);
    if username.is_empty() {
        return ServiceError::bad_request("Username cannot be empty").into_response();
    }

    match repo::latest_by_initiator(&pool, &username).await {
        Ok(Some(record)) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                "Handshake retrieved",
                HandshakeDto::from(record),
            )),
        )
            .into_response(),
        Ok(None) => ServiceError::not_found(format!(
            "No handshake found for initiator '{username}'"
        ))
        .into_response(),
        Err(err) => retrieval_failed(&err).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/v1/handshakes/by-acceptor/{username}",
    params(("username" = String, Path, description = "Acceptor username")),
    responses(
        (status = 200, description = "Most recent handshake received by the user", body = HandshakeDto),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "No handshake found"),
    ),
    tag = "handshakes"
)]
pub async fn latest_by_acceptor(
    Path(username): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
) -> impl IntoResponse {
    if let Err(err) = require_auth(&headers, &config) {
        return err.into_response();
    }

    let username = normalize_username(&username);
    if username.is_empty() {
        return ServiceError::bad_request("Username cannot be empty").into_response();
    }

    match repo::latest_by_acceptor(&pool, &username).await {
        Ok(Some(record)) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                "Handshake retrieved",
                HandshakeDto::from(record),
            )),
        )
            .into_response(),
        Ok(None) => ServiceError::not_found(format!(
            "No handshake found for acceptor '{username}'"
        ))
        .into_response(),
        Err(err) => retrieval_failed(&err).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/v1/handshakes/by-initiator/{username}/all",
    params(("username" = String, Path, description = "Initiator username")),
    responses(
        (status = 200, description = "All handshakes initiated by the user", body = [HandshakeDto]),
        (status = 401, description = "Missing or invalid token"),
    ),
    tag = "handshakes"
)]
pub async fn list_by_initiator(
    Path(username): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
) -> impl IntoResponse {
    if let Err(err) = require_auth(&headers, &config) {
        return err.into_response();
    }

    match repo::list_by_initiator(&pool, normalize_username(&username).as_str()).await {
        Ok(records) => list_response(records),
        Err(err) => retrieval_failed(&err).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/v1/handshakes/by-acceptor/{username}/all",
    params(("username" = String, Path, description = "Acceptor username")),
    responses(
        (status = 200, description = "All handshakes received by the user", body = [HandshakeDto]),
        (status = 401, description = "Missing or invalid token"),
    ),
    tag = "handshakes"
)]
pub async fn list_by_acceptor(
    Path(username): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
) -> impl IntoResponse {
    if let Err(err) = require_auth(&headers, &config) {
        return err.into_response();
    }

    match repo::list_by_acceptor(&pool, normalize_username(&username).as_str()).await {
        Ok(records) => list_response(records),
        Err(err) => retrieval_failed(&err).into_response(),
    }
}

fn list_response(records: Vec<crate::handshake::HandshakeRecord>) -> axum::response::Response {
    let dtos: Vec<HandshakeDto> = records.into_iter().map(HandshakeDto::from).collect();
    (
        StatusCode::OK,
        Json(ApiResponse::success("Handshakes retrieved", dtos)),
    )
        .into_response()
}

#[utoipa::path(
    put,
    path = "/v1/handshakes/{name}/accept",
    params(("name" = String, Path, description = "Handshake name")),
    responses(
        (status = 200, description = "Handshake accepted"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Handshake not found"),
        (status = 409, description = "Illegal status transition"),
    ),
    tag = "handshakes"
)]
pub async fn accept(
    Path(name): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
) -> impl IntoResponse {
    transition(
        &headers,
        &pool,
        &config,
        &name,
        HandshakeStatus::Accepted,
        "Handshake accepted",
    )
    .await
}

#[utoipa::path(
    put,
    path = "/v1/handshakes/{name}/reject",
    params(("name" = String, Path, description = "Handshake name")),
    responses(
        (status = 200, description = "Handshake rejected"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Handshake not found"),
        (status = 409, description = "Illegal status transition"),
    ),
    tag = "handshakes"
)]
pub async fn reject(
    Path(name): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
) -> impl IntoResponse {
    transition(
        &headers,
        &pool,
        &config,
        &name,
        HandshakeStatus::Cancelled,
        "Handshake rejected",
    )
    .await
}

#[utoipa::path(
    put,
    path = "/v1/handshakes/{name}/complete",
    params(("name" = String, Path, description = "Handshake name")),
    responses(
        (status = 200, description = "Handshake completed"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Handshake not found"),
        (status = 409, description = "Illegal status transition"),
    ),
    tag = "handshakes"
)]
pub async fn complete(
    Path(name): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
) -> impl IntoResponse {
    transition(
        &headers,
        &pool,
        &config,
        &name,
        HandshakeStatus::Completed,
        "Handshake completed",
    )
    .await
}

#[utoipa::path(
    put,
    path = "/v1/handshakes/{name}/cancel",
    params(("name" = String, Path, description = "Handshake name")),
    responses(
        (status = 200, description = "Handshake canceled"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Handshake not found"),
        (status = 409, description = "Illegal status transition"),
    ),
    tag = "handshakes"
)]
pub async fn cancel(
    Path(name): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    config: Extension<Arc<AuthConfig>>,
) -> impl IntoResponse {
    transition(
        &headers,
        &pool,
        &config,
        &name,
        HandshakeStatus::Cancelled,
        "Handshake canceled",
    )
    .await
}

async fn transition(
    headers: &HeaderMap,
    pool: &PgPool,
    config: &AuthConfig,
    name: &str,
    target: HandshakeStatus,
    message: &str,
) -> axum::response::Response {
    if let Err(err) = require_auth(headers, config) {
        return err.into_response();
    }

    let name = name.trim();
    if name.is_empty() {
        return ServiceError::bad_request("Handshake name cannot be empty").into_response();
    }

    match apply_transition(pool, name, target).await {
        Ok(()) => (StatusCode::OK, Json(ApiResponse::ok(message))).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn apply_transition(
    pool: &PgPool,
    name: &str,
    target: HandshakeStatus,
) -> Result<(), ServiceError> {
    let current = repo::find_by_name(pool, name)
        .await
        .map_err(ServiceError::Internal)?
        .ok_or_else(|| handshake_not_found(name))?;

    if !current.status.can_transition_to(target) {
        return Err(ServiceError::conflict(format!(
            "Cannot transition handshake '{name}' from {} to {target}",
            current.status
        )));
    }

    match repo::update_status(pool, name, current.status, target)
        .await
        .map_err(ServiceError::Internal)?
    {
        UpdateOutcome::Updated => Ok(()),
        // Lost the compare-and-set: someone else moved the status first.
        UpdateOutcome::Raced => Err(ServiceError::conflict(format!(
            "Handshake '{name}' was modified concurrently"
        ))),
    }
}

/// Read-path failures mean the store is unreachable, not that the caller is
/// wrong; surface them as 503.
fn retrieval_failed(err: &anyhow::Error) -> ServiceError {
    error!("Failed to retrieve handshake data: {err:?}");
    ServiceError::ServiceUnavailable("Failed to retrieve handshake data".to_string())
}

fn user_not_found(username: &str) -> ServiceError {
    ServiceError::not_found(format!("User '{username}' not found"))
}

fn handshake_not_found(name: &str) -> ServiceError {
    ServiceError::not_found(format!("Handshake with name '{name}' not found"))
}

fn handshake_name_taken(name: &str) -> ServiceError {
    ServiceError::conflict(format!("Handshake with name '{name}' already exists"))
}
