//! Request and response bodies.
//!
//! Identifiers are canonical 32-character lowercase hex strings. Dates are `YYYY-MM-DD`;
//! timestamps are RFC 3339 UTC; appointment times are local `YYYY-MM-DDTHH:MM:SS`.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub status: String,
    pub message: String,
}

/// Error envelope returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

// --- auth -------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignupReq {
    pub email: String,
    pub password: String,
    pub full_name: String,
    /// `doctor`, `nurse` or `patient`
    pub role: String,
    #[serde(default)]
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserRes {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub created_at: String,
}

/// OAuth2 password-flow form. `username` carries the email address.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenRes {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: String,
    pub user: UserRes,
}

// --- patients ---------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterPatientReq {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub gender: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub presenting_complaint: Option<String>,
    #[serde(default)]
    pub triage_level: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PatientRes {
    pub id: String,
    pub user_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub presenting_complaint: Option<String>,
    pub triage_level: Option<String>,
    pub registered_by: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TriageReq {
    /// One of `Resuscitation`, `Emergency`, `Urgent`, `Less-urgent`, `Non-urgent`
    pub triage_level: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OpdQuery {
    /// Day to list, `YYYY-MM-DD`
    pub date_filter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OpdRowRes {
    pub appointment_id: String,
    pub appointment_time: String,
    pub reason: Option<String>,
    pub status: String,
    pub patient_id: String,
    pub patient_name: String,
    pub doctor_id: String,
    pub doctor_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IpdRowRes {
    pub admission_id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub admitting_doctor_id: String,
    pub doctor_name: String,
    pub room_number: String,
    pub status: String,
    pub admission_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdmitReq {
    pub patient_id: String,
    pub room_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdmissionRes {
    pub id: String,
    pub patient_id: String,
    pub admitting_doctor_id: String,
    pub room_number: String,
    pub status: String,
    pub admission_date: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransferQuery {
    pub new_department_id: u32,
}

// --- staff & beds -----------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StaffReq {
    pub first_name: String,
    pub last_name: String,
    /// `doctor` or `nurse`
    pub role: String,
    #[serde(default)]
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StaffRes {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub role: String,
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StaffQuery {
    /// Restrict to `doctor` or `nurse`
    pub role: Option<String>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BedReq {
    pub bed_number: String,
    #[serde(default)]
    pub ward: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BedUpdateReq {
    #[serde(default)]
    pub is_occupied: Option<bool>,
    #[serde(default)]
    pub patient_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BedRes {
    pub id: String,
    pub bed_number: String,
    pub ward: Option<String>,
    pub is_occupied: bool,
    pub patient_id: Option<String>,
}

// --- appointments -----------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppointmentReq {
    pub patient_id: String,
    #[serde(default)]
    pub doctor_id: Option<String>,
    /// `YYYY-MM-DDTHH:MM[:SS]`, or RFC 3339 (converted to UTC)
    pub appointment_time: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppointmentRes {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: Option<String>,
    pub appointment_time: String,
    pub reason: Option<String>,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppointmentStatusReq {
    /// `pending`, `confirmed`, `cancelled` or `completed`
    pub status: String,
}

// --- prescriptions ----------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MedicationDto {
    pub medication_name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PrescriptionReq {
    pub patient_id: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub medications: Vec<MedicationDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PrescriptionRes {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub notes: Option<String>,
    pub medications: Vec<MedicationDto>,
    pub created_at: String,
}

// --- documents --------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentRes {
    pub id: String,
    pub patient_id: String,
    pub document_name: String,
    pub document_type: String,
    pub content_hash: String,
    pub media_type: Option<String>,
    pub size_bytes: u64,
    pub uploaded_by: String,
    pub uploaded_at: String,
}

/// Multipart form accepted by `POST /documents/upload` (documentation only).
#[derive(Debug, ToSchema)]
pub struct DocumentUploadForm {
    pub patient_id: String,
    pub document_type: String,
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}
