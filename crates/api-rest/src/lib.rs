//! # API REST
//!
//! REST API implementation for Multicare.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes)
//!
//! Uses `api-shared` for wire types and `multicare-core` for everything else.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod extract;
pub mod handlers;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::http::HeaderValue;
use axum::routing::{get, post, put};
use axum::Router;
use handlers::{appointments, auth, documents, inpatient, patients, prescriptions, staff};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        auth::signup_user,
        auth::issue_token,
        auth::logout,
        patients::register,
        patients::list,
        patients::get,
        patients::triage,
        patients::alerts,
        patients::opd,
        inpatient::ipd,
        inpatient::admit_patient,
        inpatient::discharge_admission,
        inpatient::transfer_admission,
        inpatient::beds,
        inpatient::create_bed,
        inpatient::update_bed,
        staff::list,
        staff::create,
        staff::doctors,
        appointments::create,
        appointments::list,
        appointments::update_status,
        prescriptions::create,
        prescriptions::for_patient,
        documents::upload,
        documents::for_patient,
        documents::content,
    ),
    components(schemas(
        api_shared::HealthRes,
        api_shared::ErrorRes,
        api_shared::ErrorDetail,
        api_shared::SignupReq,
        api_shared::UserRes,
        api_shared::TokenForm,
        api_shared::TokenRes,
        api_shared::RegisterPatientReq,
        api_shared::PatientRes,
        api_shared::TriageReq,
        api_shared::OpdRowRes,
        api_shared::IpdRowRes,
        api_shared::AdmitReq,
        api_shared::AdmissionRes,
        api_shared::StaffReq,
        api_shared::StaffRes,
        api_shared::BedReq,
        api_shared::BedUpdateReq,
        api_shared::BedRes,
        api_shared::AppointmentReq,
        api_shared::AppointmentRes,
        api_shared::AppointmentStatusReq,
        api_shared::MedicationDto,
        api_shared::PrescriptionReq,
        api_shared::PrescriptionRes,
        api_shared::DocumentRes,
        api_shared::DocumentUploadForm,
    )),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// Builds the CORS layer from a comma-separated origin list. `None` allows any origin.
pub fn cors_layer(allowed_origins: Option<&str>) -> CorsLayer {
    let Some(list) = allowed_origins else {
        return CorsLayer::permissive();
    };
    let origins: Vec<HeaderValue> = list
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = o, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Assembles the full router: API routes, Swagger UI, CORS and request tracing.
pub fn app(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/signup", post(auth::signup_user))
        .route("/auth/token", post(auth::issue_token))
        .route("/auth/logout", post(auth::logout))
        .route("/patients", get(patients::list))
        .route("/patients/register", post(patients::register))
        .route("/patients/alerts/high-priority", get(patients::alerts))
        .route("/patients/opd", get(patients::opd))
        .route(
            "/patients/ipd",
            get(inpatient::ipd).post(inpatient::admit_patient),
        )
        .route(
            "/patients/ipd/:admission_id/discharge",
            post(inpatient::discharge_admission),
        )
        .route(
            "/patients/ipd/:admission_id/transfer",
            post(inpatient::transfer_admission),
        )
        .route("/patients/:id", get(patients::get))
        .route("/patients/:id/triage", put(patients::triage))
        .route("/staff", get(staff::list).post(staff::create))
        .route("/beds", get(inpatient::beds).post(inpatient::create_bed))
        .route("/beds/:id", put(inpatient::update_bed))
        .route(
            "/appointments",
            get(appointments::list).post(appointments::create),
        )
        .route(
            "/appointments/",
            get(appointments::list).post(appointments::create),
        )
        .route("/appointments/doctors", get(staff::doctors))
        .route("/appointments/:id/status", put(appointments::update_status))
        .route("/prescriptions", post(prescriptions::create))
        .route("/prescriptions/", post(prescriptions::create))
        .route("/prescriptions/patient/:id", get(prescriptions::for_patient))
        .route("/documents/upload", post(documents::upload))
        .route("/documents/patient/:id", get(documents::for_patient))
        .route("/documents/:id/content", get(documents::content))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests;
