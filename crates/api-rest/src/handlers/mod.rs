//! Route handlers, one module per resource.
//!
//! Handlers decode and validate the request, then hand one closure to [`AppState::run`] that
//! resolves the caller and performs the operation on a single connection.
//!
//! [`AppState::run`]: crate::state::AppState::run

pub mod appointments;
pub mod auth;
pub mod documents;
pub mod inpatient;
pub mod patients;
pub mod prescriptions;
pub mod staff;

use api_shared::{HealthRes, HealthService};
use axum::Json;

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
pub async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}
