//! Issued bearer tokens, stored only as SHA-256 digests.

use crate::db::timestamp;
use crate::model::User;
use crate::repositories::users;
use crate::CoreResult;
use chrono::{DateTime, Utc};
use multicare_uuid::ShardableUuid;
use rusqlite::{params, Connection, OptionalExtension};

pub fn insert(
    conn: &Connection,
    token_hash: &str,
    user_id: &ShardableUuid,
    issued_at: &DateTime<Utc>,
    expires_at: &DateTime<Utc>,
) -> CoreResult<()> {
    conn.execute(
        "INSERT INTO sessions (token_hash, user_id, issued_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            token_hash,
            user_id.to_string(),
            timestamp(issued_at),
            timestamp(expires_at),
        ],
    )?;
    Ok(())
}

/// User owning an unexpired session with this digest.
pub fn find_active_user(
    conn: &Connection,
    token_hash: &str,
    now: &DateTime<Utc>,
) -> CoreResult<Option<User>> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {} FROM sessions s JOIN users u ON u.id = s.user_id
                 WHERE s.token_hash = ?1 AND s.expires_at > ?2",
                users::qualified_columns("u")
            ),
            params![token_hash, timestamp(now)],
            |row| users::from_row_at(row, 0),
        )
        .optional()?)
}

pub fn delete(conn: &Connection, token_hash: &str) -> CoreResult<bool> {
    let removed = conn.execute(
        "DELETE FROM sessions WHERE token_hash = ?1",
        params![token_hash],
    )?;
    Ok(removed == 1)
}

/// Drops sessions that expired at or before `now`. Returns how many were removed.
pub fn purge_expired(conn: &Connection, now: &DateTime<Utc>) -> CoreResult<usize> {
    Ok(conn.execute(
        "DELETE FROM sessions WHERE expires_at <= ?1",
        params![timestamp(now)],
    )?)
}
