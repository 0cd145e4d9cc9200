//! # API Shared
//!
//! Shared definitions for the Multicare HTTP API.
//!
//! Contains:
//! - Wire types (`dto` module): request and response bodies with OpenAPI schemas
//! - Conversions between wire types and core domain types
//! - Shared services like `HealthService`
//! - Bearer header parsing
//!
//! Wire types carry identifiers and dates as strings; converting a request into a core type is
//! where they get validated.

pub mod auth;
pub mod convert;
pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;
