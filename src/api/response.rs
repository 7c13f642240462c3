//! Uniform response envelope.
//!
//! Every endpoint answers `{message, httpStatus, data}` so clients can treat
//! success and error payloads the same way.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub message: String,
    pub http_status: u16,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Successful response with a payload.
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            http_status: 200,
            data: Some(data),
        }
    }

    /// Successful response with a payload and a non-200 status (e.g. 201).
    pub fn success_with_status(message: impl Into<String>, status: u16, data: T) -> Self {
        Self {
            message: message.into(),
            http_status: status,
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Successful response without a payload.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            http_status: 200,
            data: None,
        }
    }

    /// Error response without a payload.
    pub fn error(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            http_status: status,
            data: None,
        }
    }
}
