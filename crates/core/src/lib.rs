//! # Multicare Core
//!
//! Business logic for the Multicare hospital backend:
//! - Entity store on SQLite (`db`, `repositories`)
//! - Credential service and authorization gate (`auth`, `access`)
//! - Clinical workflow engine: triage, beds, admissions, appointments, prescriptions,
//!   documents (`workflow`)
//! - OPD/IPD read views (`reporting`)
//!
//! **No API concerns**: HTTP routing, request parsing and status codes belong in `api-rest`.
//! Everything here takes an explicit connection and, where gated, an [`access::Actor`].

pub mod access;
pub mod auth;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod model;
pub mod reporting;
pub mod repositories;
pub mod workflow;

pub use config::CoreConfig;
pub use constants::{DEFAULT_DATABASE_PATH, DEFAULT_UPLOAD_DIR};
pub use db::Store;
pub use error::{CoreError, CoreResult};
pub use multicare_types::{EmailAddress, NonEmptyText};
pub use multicare_uuid::ShardableUuid;
pub use rusqlite::Connection;
