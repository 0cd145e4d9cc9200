//! SQLite entity store.
//!
//! The store is a single database file. [`Store`] remembers where it lives and hands out a fresh
//! [`Connection`] per unit of work; the connection is closed when it is dropped, on every exit
//! path. Writers use `BEGIN IMMEDIATE` (see [`begin_write`]) so SQLite serialises them, and the
//! busy timeout makes a second writer wait instead of failing.
//!
//! Schema changes are versioned migrations recorded in `schema_version`. Opening a store that
//! is already current is a no-op.

use crate::constants::BUSY_TIMEOUT_MS;
use crate::{CoreError, CoreResult};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use multicare_types::NonEmptyText;
use rusqlite::types::Type;
use rusqlite::{Connection, Row, Transaction, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("../migrations/001_initial.sql"))];

/// Handle to the on-disk store.
#[derive(Clone, Debug)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    /// Opens (creating if necessary) the database at `path` and applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Database` if the file cannot be opened, or `CoreError::Migration` if
    /// a migration fails.
    pub fn open(path: &Path) -> CoreResult<Self> {
        let conn = open_connection(path)?;
        run_migrations(&conn)?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Opens a new connection for one request or command.
    pub fn connection(&self) -> CoreResult<Connection> {
        open_connection(&self.path)
    }
}

fn open_connection(path: &Path) -> CoreResult<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS))?;
    configure_pragmas(&conn)?;
    Ok(conn)
}

fn configure_pragmas(conn: &Connection) -> CoreResult<()> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA foreign_keys=ON;",
    )?;
    Ok(())
}

/// Run all pending migrations, each in its own transaction.
pub fn run_migrations(conn: &Connection) -> CoreResult<()> {
    let current_version = current_schema_version(conn);

    for (version, sql) in MIGRATIONS {
        if *version > current_version {
            tracing::info!("Running migration v{version}");
            let tx = conn.unchecked_transaction()?;
            tx.execute_batch(sql)
                .and_then(|_| tx.commit())
                .map_err(|e| CoreError::Migration {
                    version: *version,
                    reason: e.to_string(),
                })?;
        }
    }

    Ok(())
}

/// Current schema version (0 if no schema exists yet).
pub fn current_schema_version(conn: &Connection) -> i64 {
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get::<_, Option<i64>>(0)
    })
    .ok()
    .flatten()
    .unwrap_or(0)
}

/// Starts a write transaction that takes the database write lock up front.
///
/// Rolled back on drop unless committed.
pub fn begin_write(conn: &mut Connection) -> CoreResult<Transaction<'_>> {
    Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}

/// Current time at the precision the store keeps, so a freshly created record equals its
/// read-back.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Storage form of a timestamp.
pub(crate) fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Reads a text column and parses it with `FromStr`.
pub(crate) fn parsed_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Nullable variant of [`parsed_column`].
pub(crate) fn opt_parsed_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        s.parse::<T>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

pub(crate) fn text_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NonEmptyText> {
    let raw: String = row.get(idx)?;
    NonEmptyText::new(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn opt_text_column(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<NonEmptyText>> {
    let raw: Option<String> = row.get(idx)?;
    Ok(NonEmptyText::optional(raw))
}

pub(crate) fn opt_str(value: &Option<NonEmptyText>) -> Option<&str> {
    value.as_ref().map(NonEmptyText::as_str)
}
