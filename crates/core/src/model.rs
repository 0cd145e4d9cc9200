//! Domain records held in the entity store.
//!
//! Every clinical record (bed, admission, appointment, prescription, document) refers to
//! exactly one [`Patient`]. Records are never hard-deleted; lifecycle is modelled by status
//! fields.

use crate::constants::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crate::CoreError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use multicare_types::{EmailAddress, NonEmptyText};
use multicare_uuid::{Sha256Hash, ShardableUuid};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Implements `as_str`, `Display` and a case-insensitive `FromStr` for a closed string enum.
macro_rules! string_enum {
    ($ty:ident, $label:literal, { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                $(
                    if trimmed.eq_ignore_ascii_case($wire) {
                        return Ok($ty::$variant);
                    }
                )+
                let allowed: Vec<&str> = $ty::ALL.iter().map(|v| v.as_str()).collect();
                Err(CoreError::InvalidInput(format!(
                    "invalid {}: '{}' (expected one of: {})",
                    $label,
                    s,
                    allowed.join(", ")
                )))
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Doctor,
    Nurse,
    Patient,
}

string_enum!(Role, "role", {
    Doctor => "doctor",
    Nurse => "nurse",
    Patient => "patient",
});

impl Role {
    /// Doctors and nurses are staff; patients are not.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Doctor | Role::Nurse)
    }
}

/// Clinical urgency assigned by staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriageLevel {
    Resuscitation,
    Emergency,
    Urgent,
    #[serde(rename = "Less-urgent")]
    LessUrgent,
    #[serde(rename = "Non-urgent")]
    NonUrgent,
}

string_enum!(TriageLevel, "triage level", {
    Resuscitation => "Resuscitation",
    Emergency => "Emergency",
    Urgent => "Urgent",
    LessUrgent => "Less-urgent",
    NonUrgent => "Non-urgent",
});

impl TriageLevel {
    /// Levels that raise a high-priority alert.
    pub const HIGH_PRIORITY: [TriageLevel; 2] = [TriageLevel::Resuscitation, TriageLevel::Emergency];

    pub fn is_high_priority(&self) -> bool {
        Self::HIGH_PRIORITY.contains(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdmissionStatus {
    Admitted,
    Discharged,
    Transferred,
}

string_enum!(AdmissionStatus, "admission status", {
    Admitted => "Admitted",
    Discharged => "Discharged",
    Transferred => "Transferred",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

string_enum!(AppointmentStatus, "appointment status", {
    Pending => "pending",
    Confirmed => "confirmed",
    Cancelled => "cancelled",
    Completed => "completed",
});

impl AppointmentStatus {
    /// No further status change is allowed once an appointment is cancelled or completed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::Completed)
    }
}

/// Offset pagination for list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u32,
    pub limit: u32,
}

impl Page {
    /// Applies defaults and clamps `limit` to `1..=MAX_PAGE_LIMIT`.
    pub fn new(skip: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            skip: skip.unwrap_or(0),
            limit: limit
                .unwrap_or(DEFAULT_PAGE_LIMIT)
                .clamp(1, MAX_PAGE_LIMIT),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: ShardableUuid,
    pub user_id: Option<ShardableUuid>,
    pub first_name: NonEmptyText,
    pub last_name: NonEmptyText,
    pub date_of_birth: NaiveDate,
    pub gender: NonEmptyText,
    pub phone_number: Option<NonEmptyText>,
    pub address: Option<NonEmptyText>,
    pub presenting_complaint: Option<NonEmptyText>,
    pub triage_level: Option<TriageLevel>,
    pub registered_by: Option<ShardableUuid>,
    pub created_at: DateTime<Utc>,
}

impl Patient {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Fields supplied when registering a patient.
#[derive(Debug, Clone)]
pub struct NewPatient {
    pub user_id: Option<ShardableUuid>,
    pub first_name: NonEmptyText,
    pub last_name: NonEmptyText,
    pub date_of_birth: NaiveDate,
    pub gender: NonEmptyText,
    pub phone_number: Option<NonEmptyText>,
    pub address: Option<NonEmptyText>,
    pub presenting_complaint: Option<NonEmptyText>,
    pub triage_level: Option<TriageLevel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    pub id: ShardableUuid,
    pub first_name: NonEmptyText,
    pub last_name: NonEmptyText,
    pub role: Role,
    pub specialization: Option<NonEmptyText>,
    pub created_at: DateTime<Utc>,
}

impl Staff {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone)]
pub struct NewStaff {
    pub first_name: NonEmptyText,
    pub last_name: NonEmptyText,
    pub role: Role,
    pub specialization: Option<NonEmptyText>,
}

/// Login account. `password_hash` is never serialised.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: ShardableUuid,
    pub email: EmailAddress,
    pub full_name: NonEmptyText,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bed {
    pub id: ShardableUuid,
    pub bed_number: NonEmptyText,
    pub ward: Option<NonEmptyText>,
    pub is_occupied: bool,
    pub patient_id: Option<ShardableUuid>,
}

#[derive(Debug, Clone)]
pub struct NewBed {
    pub bed_number: NonEmptyText,
    pub ward: Option<NonEmptyText>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Admission {
    pub id: ShardableUuid,
    pub patient_id: ShardableUuid,
    pub admitting_doctor_id: ShardableUuid,
    pub room_number: NonEmptyText,
    pub status: AdmissionStatus,
    pub admission_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: ShardableUuid,
    pub patient_id: ShardableUuid,
    pub doctor_id: Option<ShardableUuid>,
    pub appointment_time: NaiveDateTime,
    pub reason: Option<NonEmptyText>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub patient_id: ShardableUuid,
    pub doctor_id: Option<ShardableUuid>,
    pub appointment_time: NaiveDateTime,
    pub reason: Option<NonEmptyText>,
}

/// One line of a prescription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub medication_name: NonEmptyText,
    pub dosage: NonEmptyText,
    pub frequency: NonEmptyText,
    pub duration: NonEmptyText,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: ShardableUuid,
    pub patient_id: ShardableUuid,
    pub doctor_id: ShardableUuid,
    pub notes: Option<NonEmptyText>,
    pub medications: Vec<Medication>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPrescription {
    pub patient_id: ShardableUuid,
    pub notes: Option<NonEmptyText>,
    pub medications: Vec<Medication>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: ShardableUuid,
    pub patient_id: ShardableUuid,
    pub document_name: NonEmptyText,
    pub document_type: NonEmptyText,
    pub storage_path: NonEmptyText,
    pub content_hash: Sha256Hash,
    pub media_type: Option<NonEmptyText>,
    pub size_bytes: u64,
    pub uploaded_by: ShardableUuid,
    pub uploaded_at: DateTime<Utc>,
}
