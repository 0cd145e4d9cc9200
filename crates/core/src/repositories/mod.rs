//! Entity repositories.
//!
//! One module per table. Functions take a `&Connection` so they run equally against a plain
//! connection or inside a [`rusqlite::Transaction`]; callers that need several statements to
//! land together open the transaction (see [`crate::db::begin_write`]).
//!
//! Lookups that the caller must react to return `CoreError::NotFound` rather than `None`.

pub mod admissions;
pub mod appointments;
pub mod beds;
pub mod documents;
pub mod patients;
pub mod prescriptions;
pub mod sessions;
pub mod staff;
pub mod users;
