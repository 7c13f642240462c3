//! User registry: account records and lookups.

pub mod repo;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Full user row. Never serialized; the password hash stays server-side.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub public_key: Option<String>,
    pub enabled: bool,
    pub locked: bool,
    pub created_at: DateTime<Utc>,
}

/// Public view of a user.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub username: String,
    pub email: String,
}

impl From<&UserRecord> for UserDto {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dto_excludes_sensitive_fields() {
        let record = UserRecord {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$...".to_string(),
            public_key: None,
            enabled: true,
            locked: false,
            created_at: Utc::now(),
        };

        let dto = UserDto::from(&record);
        let json = serde_json::to_value(&dto).expect("serialize");
        assert_eq!(json["username"], "alice");
        assert_eq!(json["email"], "alice@example.com");
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
    }
}
