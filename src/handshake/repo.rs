//! Database access for the handshake registry.

use anyhow::{Context, Result};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use crate::user::repo::is_unique_violation;

use super::{HandshakeRecord, HandshakeStatus};

/// Outcome when attempting to insert a new handshake.
#[derive(Debug)]
pub enum CreateOutcome {
    Created,
    Conflict,
}

/// Outcome of a compare-and-set status update.
#[derive(Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    /// The row changed under us (or disappeared) between read and write.
    Raced,
}

const SELECT_COLUMNS: &str = r"
    id, handshake_name, encrypted_details, status,
    initiator_username, acceptor_username,
    created_date, most_recent_update_date
";

fn record_from_row(row: &PgRow) -> Result<HandshakeRecord> {
    let status: String = row.get("status");
    let status = status
        .parse::<HandshakeStatus>()
        .context("corrupt status column")?;

    Ok(HandshakeRecord {
        id: row.get("id"),
        handshake_name: row.get("handshake_name"),
        encrypted_details: row.get("encrypted_details"),
        status,
        initiator_username: row.get("initiator_username"),
        acceptor_username: row.get("acceptor_username"),
        created_date: row.get("created_date"),
        most_recent_update_date: row.get("most_recent_update_date"),
    })
}

pub async fn exists_by_name(pool: &PgPool, handshake_name: &str) -> Result<bool> {
    let query = "SELECT EXISTS(SELECT 1 FROM handshakes WHERE handshake_name = $1) AS present";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(handshake_name)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to check handshake existence")?;

    Ok(row.get("present"))
}

/// Insert a new handshake in `CREATED` state with a server-side creation
/// date. Name collisions surface as `Conflict`.
pub async fn insert(
    pool: &PgPool,
    handshake_name: &str,
    encrypted_details: Option<&str>,
    initiator_id: Uuid,
    initiator_username: &str,
    acceptor_id: Uuid,
    acceptor_username: &str,
) -> Result<CreateOutcome> {
    let query = r"
        INSERT INTO handshakes
            (handshake_name, encrypted_details, status,
             initiator_id, initiator_username, acceptor_id, acceptor_username)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(handshake_name)
        .bind(encrypted_details)
        .bind(HandshakeStatus::Created.as_str())
        .bind(initiator_id)
        .bind(initiator_username)
        .bind(acceptor_id)
        .bind(acceptor_username)
        .execute(pool)
        .instrument(span)
        .await;

    match result {
        Ok(_) => Ok(CreateOutcome::Created),
        Err(err) if is_unique_violation(&err) => Ok(CreateOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert handshake"),
    }
}

pub async fn find_by_name(pool: &PgPool, handshake_name: &str) -> Result<Option<HandshakeRecord>> {
    let query = format!("SELECT {SELECT_COLUMNS} FROM handshakes WHERE handshake_name = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(handshake_name)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup handshake by name")?;

    row.as_ref().map(record_from_row).transpose()
}

/// Most recent handshake initiated by `username`, if any.
pub async fn latest_by_initiator(
    pool: &PgPool,
    username: &str,
) -> Result<Option<HandshakeRecord>> {
    latest_by_participant(pool, "initiator_username", username).await
}

/// Most recent handshake received by `username`, if any.
pub async fn latest_by_acceptor(pool: &PgPool, username: &str) -> Result<Option<HandshakeRecord>> {
    latest_by_participant(pool, "acceptor_username", username).await
}

async fn latest_by_participant(
    pool: &PgPool,
    column: &str,
    username: &str,
) -> Result<Option<HandshakeRecord>> {
    let query = format!(
        "SELECT {SELECT_COLUMNS} FROM handshakes WHERE {column} = $1 \
         ORDER BY created_date DESC LIMIT 1"
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup handshake by participant")?;

    row.as_ref().map(record_from_row).transpose()
}

pub async fn list_by_initiator(pool: &PgPool, username: &str) -> Result<Vec<HandshakeRecord>> {
    list_by_participant(pool, "initiator_username", username).await
}

pub async fn list_by_acceptor(pool: &PgPool, username: &str) -> Result<Vec<HandshakeRecord>> {
    list_by_participant(pool, "acceptor_username", username).await
}

async fn list_by_participant(
    pool: &PgPool,
    column: &str,
    username: &str,
) -> Result<Vec<HandshakeRecord>> {
    let query = format!(
        "SELECT {SELECT_COLUMNS} FROM handshakes WHERE {column} = $1 \
         ORDER BY created_date DESC"
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let rows = sqlx::query(&query)
        .bind(username)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list handshakes by participant")?;

    rows.iter().map(record_from_row).collect()
}

/// Compare-and-set status update. The write only lands when the row still
/// carries the status the caller observed, so concurrent updates cannot
/// silently last-write-win.
pub async fn update_status(
    pool: &PgPool,
    handshake_name: &str,
    expected: HandshakeStatus,
    next: HandshakeStatus,
) -> Result<UpdateOutcome> {
    let query = r"
        UPDATE handshakes
        SET status = $1, most_recent_update_date = NOW()
        WHERE handshake_name = $2 AND status = $3
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(next.as_str())
        .bind(handshake_name)
        .bind(expected.as_str())
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update handshake status")?;

    if result.rows_affected() > 0 {
        Ok(UpdateOutcome::Updated)
    } else {
        Ok(UpdateOutcome::Raced)
    }
}
