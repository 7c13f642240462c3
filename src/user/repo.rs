//! Database access for the user registry.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;

use super::UserRecord;

/// Outcome when attempting to insert a new user.
#[derive(Debug)]
pub enum RegisterOutcome {
    Created,
    Conflict,
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

pub async fn username_exists(pool: &PgPool, username: &str) -> Result<bool> {
    let query = "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1) AS present";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to check username existence")?;

    Ok(row.get("present"))
}

pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool> {
    let query = "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1) AS present";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to check email existence")?;

    Ok(row.get("present"))
}

/// Insert a new user. Unique-constraint races surface as `Conflict` rather
/// than an error so callers can map them to 409.
pub async fn insert_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<RegisterOutcome> {
    let query = r"
        INSERT INTO users (username, email, password_hash)
        VALUES ($1, $2, $3)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .execute(pool)
        .instrument(span)
        .await;

    match result {
        Ok(_) => Ok(RegisterOutcome::Created),
        Err(err) if is_unique_violation(&err) => Ok(RegisterOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert user"),
    }
}

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<UserRecord>> {
    let query = r"
        SELECT id, username, email, password_hash, public_key, enabled, locked, created_at
        FROM users
        WHERE username = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by username")?;

    Ok(row.map(|row| UserRecord {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        public_key: row.get("public_key"),
        enabled: row.get("enabled"),
        locked: row.get("locked"),
        created_at: row.get("created_at"),
    }))
}

/// All registered usernames, newest first.
pub async fn fetch_usernames(pool: &PgPool) -> Result<Vec<String>> {
    let query = "SELECT username FROM users ORDER BY created_at DESC";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list usernames")?;

    Ok(rows.into_iter().map(|row| row.get("username")).collect())
}

/// Set the user's public key. Returns false when the user does not exist.
pub async fn update_public_key(pool: &PgPool, username: &str, public_key: &str) -> Result<bool> {
    let query = r"
        UPDATE users
        SET public_key = $1, updated_at = NOW()
        WHERE username = $2
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(public_key)
        .bind(username)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update public key")?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn is_unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
        }));
        assert!(!is_unique_violation(&err));

        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
    }
}
