//! Database helpers for users and refresh-token revocation.

use anyhow::{Context, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::time::Duration;
use tracing::{error, trace, Instrument};
use uuid::Uuid;

use super::utils::{is_unique_violation, unix_now};

const REVOCATION_CLEANER_INTERVAL_SECONDS: u64 = 300;

/// Outcome when attempting to create a new user.
#[derive(Debug)]
pub(super) enum RegisterOutcome {
    Created(UserRecord),
    Conflict,
}

#[derive(Debug, Clone)]
pub(crate) struct UserRecord {
    pub(crate) id: Uuid,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password_hash: String,
    pub(crate) is_admin: bool,
}

fn user_from_row(row: &SqliteRow) -> Result<UserRecord> {
    let id: String = row.get("id");
    Ok(UserRecord {
        id: Uuid::parse_str(&id).context("invalid user id in database")?,
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        is_admin: row.get("is_admin"),
    })
}

pub(super) async fn insert_user(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    password_hash: &str,
    is_admin: bool,
) -> Result<RegisterOutcome> {
    let record = UserRecord {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        is_admin,
    };

    let query = r"
        INSERT INTO users (id, username, email, password_hash, is_admin, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "INSERT",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(record.id.to_string())
        .bind(&record.username)
        .bind(&record.email)
        .bind(&record.password_hash)
        .bind(record.is_admin)
        .bind(unix_now())
        .execute(pool)
        .instrument(span)
        .await;

    match result {
        Ok(_) => Ok(RegisterOutcome::Created(record)),
        Err(err) if is_unique_violation(&err) => Ok(RegisterOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert user"),
    }
}

pub(crate) async fn lookup_user_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<UserRecord>> {
    let query = r"
        SELECT id, username, email, password_hash, is_admin
        FROM users
        WHERE username = ?1
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by username")?;

    row.as_ref().map(user_from_row).transpose()
}

pub(crate) async fn lookup_user_by_id(
    pool: &SqlitePool,
    user_id: Uuid,
) -> Result<Option<UserRecord>> {
    let query = r"
        SELECT id, username, email, password_hash, is_admin
        FROM users
        WHERE id = ?1
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id.to_string())
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by id")?;

    row.as_ref().map(user_from_row).transpose()
}

/// Blacklist a refresh-token id. Idempotent: re-revoking is a no-op, and no
/// row is ever removed before the token's own expiry.
pub(super) async fn revoke_refresh_token(
    pool: &SqlitePool,
    token_id: &str,
    expires_at: i64,
) -> Result<()> {
    let query = r"
        INSERT OR IGNORE INTO revoked_refresh_tokens (token_id, expires_at, revoked_at)
        VALUES (?1, ?2, ?3)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(token_id)
        .bind(expires_at)
        .bind(unix_now())
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to revoke refresh token")?;
    Ok(())
}

pub(super) async fn is_refresh_token_revoked(pool: &SqlitePool, token_id: &str) -> Result<bool> {
    let query = r"
        SELECT 1
        FROM revoked_refresh_tokens
        WHERE token_id = ?1
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to check refresh token revocation")?;
    Ok(row.is_some())
}

/// Drop revocation rows whose tokens have expired on their own.
///
/// Expiry is checked before revocation during validation, so purging an
/// expired row can never resurrect a token.
pub(super) async fn purge_expired_revocations(pool: &SqlitePool, now: i64) -> Result<u64> {
    let query = "DELETE FROM revoked_refresh_tokens WHERE expires_at <= ?1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(now)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to purge expired revocations")?;
    Ok(result.rows_affected())
}

/// Periodically purge revocation rows for naturally expired tokens.
pub(crate) fn spawn_revocation_cleaner(pool: SqlitePool) {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(Duration::from_secs(REVOCATION_CLEANER_INTERVAL_SECONDS));
        loop {
            interval.tick().await;
            trace!("Purging expired refresh-token revocations...");
            match purge_expired_revocations(&pool, unix_now()).await {
                Ok(purged) if purged > 0 => {
                    trace!("Purged {purged} expired revocation rows");
                }
                Ok(_) => {}
                Err(err) => {
                    error!("Failed to purge expired revocations: {err}");
                }
            }
        }
    });
}
