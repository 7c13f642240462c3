//! Handshake registry: bilateral agreements with a guarded status lifecycle.

pub mod repo;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle states of a handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HandshakeStatus {
    Created,
    Pending,
    Accepted,
    Cancelled,
    Completed,
    Failed,
}

impl HandshakeStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::Cancelled => "CANCELLED",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    /// Explicit transition table. Anything not listed here is rejected; the
    /// status column is never a free-form setter.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::Pending | Self::Accepted | Self::Cancelled)
                | (Self::Pending, Self::Accepted | Self::Cancelled)
                | (Self::Accepted, Self::Completed | Self::Failed | Self::Cancelled)
        )
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed | Self::Failed)
    }
}

impl fmt::Display for HandshakeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HandshakeStatus {
    type Err = InvalidStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "CREATED" => Ok(Self::Created),
            "PENDING" => Ok(Self::Pending),
            "ACCEPTED" => Ok(Self::Accepted),
            "CANCELLED" => Ok(Self::Cancelled),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            _ => Err(InvalidStatus(value.to_string())),
        }
    }
}

/// Status text in the database did not match any known state.
#[derive(Debug, thiserror::Error)]
#[error("invalid handshake status: {0}")]
pub struct InvalidStatus(pub String);

/// Full handshake row.
#[derive(Debug, Clone)]
pub struct HandshakeRecord {
    pub id: Uuid,
    pub handshake_name: String,
    pub encrypted_details: Option<String>,
    pub status: HandshakeStatus,
    pub initiator_username: String,
    pub acceptor_username: String,
    pub created_date: DateTime<Utc>,
    pub most_recent_update_date: Option<DateTime<Utc>>,
}

/// Wire representation of a handshake.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeDto {
    pub handshake_name: String,
    pub encrypted_details: Option<String>,
    pub handshake_status: HandshakeStatus,
    pub initiator_username: String,
    pub acceptor_username: String,
    pub created_date: DateTime<Utc>,
    pub most_recent_update_date: Option<DateTime<Utc>>,
}

impl From<HandshakeRecord> for HandshakeDto {
    fn from(record: HandshakeRecord) -> Self {
        Self {
            handshake_name: record.handshake_name,
            encrypted_details: record.encrypted_details,
            handshake_status: record.status,
            initiator_username: record.initiator_username,
            acceptor_username: record.acceptor_username,
            created_date: record.created_date,
            most_recent_update_date: record.most_recent_update_date,
        }
    }
}
