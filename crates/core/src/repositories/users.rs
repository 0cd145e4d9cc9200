use crate::db::{parsed_column, text_column, timestamp};
use crate::model::User;
use crate::{CoreError, CoreResult};
use multicare_types::EmailAddress;
use multicare_uuid::ShardableUuid;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

const COLUMNS: &str = "id, email, full_name, password_hash, role, created_at";

pub(crate) fn from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<User> {
    let email: String = row.get(offset + 1)?;
    Ok(User {
        id: parsed_column(row, offset)?,
        email: EmailAddress::parse(email).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(offset + 1, Type::Text, Box::new(e))
        })?,
        full_name: text_column(row, offset + 2)?,
        password_hash: row.get(offset + 3)?,
        role: parsed_column(row, offset + 4)?,
        created_at: parsed_column(row, offset + 5)?,
    })
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    from_row_at(row, 0)
}

/// Column list for joins that select a user alongside other tables.
pub(crate) fn qualified_columns(alias: &str) -> String {
    COLUMNS
        .split(", ")
        .map(|c| format!("{alias}.{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Inserts a user. An email already in use (case-insensitively) fails with `DuplicateKey`.
pub fn insert(conn: &Connection, user: &User) -> CoreResult<()> {
    conn.execute(
        &format!("INSERT INTO users ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
        params![
            user.id.to_string(),
            user.email.as_str(),
            user.full_name.as_str(),
            user.password_hash,
            user.role.as_str(),
            timestamp(&user.created_at),
        ],
    )
    .map_err(|e| match CoreError::from(e) {
        CoreError::DuplicateKey(_) => CoreError::DuplicateKey("Email already registered".into()),
        other => other,
    })?;
    Ok(())
}

pub fn get(conn: &Connection, id: &ShardableUuid) -> CoreResult<User> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM users WHERE id = ?1"),
        params![id.to_string()],
        from_row,
    )
    .optional()?
    .ok_or_else(|| CoreError::not_found("user", id))
}

pub fn find_by_email(conn: &Connection, email: &EmailAddress) -> CoreResult<Option<User>> {
    Ok(conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM users WHERE email = ?1"),
            params![email.as_str()],
            from_row,
        )
        .optional()?)
}
