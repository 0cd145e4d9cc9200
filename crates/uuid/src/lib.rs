//! Record identifiers and sharded-path utilities.
//!
//! Every Multicare record (patient, bed, admission, document, ...) is keyed by a *canonical*
//! UUID: **32 lowercase hexadecimal characters** with no hyphens, e.g.
//! `550e8400e29b41d4a716446655440000`. This is the value `Uuid::new_v4().simple()` produces.
//!
//! Externally supplied identifiers (path segments, request bodies, CLI arguments) must already
//! be canonical. Use [`ShardableUuid::parse`] to validate them; hyphenated or uppercase forms
//! are rejected rather than normalised so that one record never has two spellings.
//!
//! ## Sharded directory layout
//! Patient documents are stored on disk under a directory derived from the patient id:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`, which keeps any single directory small.

mod service;

pub use service::{Sha256Hash, ShardableUuid, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
