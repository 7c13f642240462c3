//! Central error taxonomy mapped onto the response envelope.
//!
//! Categories mirror the HTTP surface: validation 400, authentication 401,
//! account status 403, not-found 404, conflict 409, upstream 503, and
//! everything unexpected 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use super::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    BadRequest(String),

    /// Credential failures share one message so callers cannot probe which
    /// part was wrong.
    #[error("Invalid username or password")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("An unexpected error occurred")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        if let Self::Internal(ref err) = self {
            // The cause stays in the logs; clients get a generic message.
            error!("Unhandled error: {err:?}");
        }

        let status = self.status();
        let body = ApiResponse::<()>::error(self.to_string(), status.as_u16());
        (status, Json(body)).into_response()
    }
}
