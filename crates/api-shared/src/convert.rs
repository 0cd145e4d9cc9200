//! Conversions between wire types and core domain types.
//!
//! Responses are infallible `From` impls. Requests are `TryFrom` and fail with
//! `CoreError::InvalidInput` naming the offending field.

use crate::dto::*;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use multicare_core::auth::Signup;
use multicare_core::model::{
    Admission, Appointment, Bed, Document, Medication, NewAppointment, NewBed, NewPatient,
    NewPrescription, NewStaff, Patient, Prescription, Role, Staff, TriageLevel, User,
};
use multicare_core::reporting::{IpdRow, OpdRow};
use multicare_core::repositories::appointments::TIME_FORMAT;
use multicare_core::{CoreError, CoreResult, EmailAddress, NonEmptyText, ShardableUuid};

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn text(value: Option<NonEmptyText>) -> Option<String> {
    value.map(NonEmptyText::into_inner)
}

fn required(field: &str, value: &str) -> CoreResult<NonEmptyText> {
    NonEmptyText::new(value)
        .map_err(|_| CoreError::InvalidInput(format!("{field} must not be empty")))
}

/// Parses a canonical identifier, naming the field on failure.
pub fn parse_id(field: &str, value: &str) -> CoreResult<ShardableUuid> {
    ShardableUuid::parse(value.trim())
        .map_err(|_| CoreError::InvalidInput(format!("{field} is not a valid identifier: '{value}'")))
}

fn optional_id(field: &str, value: Option<&str>) -> CoreResult<Option<ShardableUuid>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => parse_id(field, v).map(Some),
        None => Ok(None),
    }
}

/// Parses a calendar date in `YYYY-MM-DD` form.
pub fn parse_date(field: &str, value: &str) -> CoreResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| CoreError::InvalidInput(format!("{field} must be a YYYY-MM-DD date")))
}

/// Accepts a local `YYYY-MM-DDTHH:MM[:SS[.f]]` (a space separator also works) or an RFC 3339
/// timestamp, which is normalised to UTC. Sub-seconds are dropped; appointments are stored to
/// the second.
pub fn parse_appointment_time(value: &str) -> CoreResult<NaiveDateTime> {
    let value = value.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc).naive_utc().trunc_subsecs(0));
    }
    const LOCAL_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|at| at.trunc_subsecs(0))
        .ok_or_else(|| {
            CoreError::InvalidInput(format!(
                "appointment_time must look like 2026-03-14T09:30:00, got '{value}'"
            ))
        })
}

// --- responses --------------------------------------------------------------

impl From<User> for UserRes {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.to_string(),
            full_name: user.full_name.into_inner(),
            role: user.role.to_string(),
            created_at: timestamp(&user.created_at),
        }
    }
}

impl From<Patient> for PatientRes {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id.to_string(),
            user_id: patient.user_id.as_ref().map(|id| id.to_string()),
            full_name: patient.display_name(),
            first_name: patient.first_name.into_inner(),
            last_name: patient.last_name.into_inner(),
            date_of_birth: patient.date_of_birth.format("%Y-%m-%d").to_string(),
            gender: patient.gender.into_inner(),
            phone_number: text(patient.phone_number),
            address: text(patient.address),
            presenting_complaint: text(patient.presenting_complaint),
            triage_level: patient.triage_level.map(|t| t.to_string()),
            registered_by: patient.registered_by.map(|id| id.to_string()),
            created_at: timestamp(&patient.created_at),
        }
    }
}

impl From<Staff> for StaffRes {
    fn from(staff: Staff) -> Self {
        Self {
            id: staff.id.to_string(),
            full_name: staff.display_name(),
            first_name: staff.first_name.into_inner(),
            last_name: staff.last_name.into_inner(),
            role: staff.role.to_string(),
            specialization: text(staff.specialization),
        }
    }
}

impl From<Bed> for BedRes {
    fn from(bed: Bed) -> Self {
        Self {
            id: bed.id.to_string(),
            bed_number: bed.bed_number.into_inner(),
            ward: text(bed.ward),
            is_occupied: bed.is_occupied,
            patient_id: bed.patient_id.map(|id| id.to_string()),
        }
    }
}

impl From<Admission> for AdmissionRes {
    fn from(admission: Admission) -> Self {
        Self {
            id: admission.id.to_string(),
            patient_id: admission.patient_id.to_string(),
            admitting_doctor_id: admission.admitting_doctor_id.to_string(),
            room_number: admission.room_number.into_inner(),
            status: admission.status.to_string(),
            admission_date: timestamp(&admission.admission_date),
            updated_at: timestamp(&admission.updated_at),
        }
    }
}

impl From<Appointment> for AppointmentRes {
    fn from(appointment: Appointment) -> Self {
        Self {
            id: appointment.id.to_string(),
            patient_id: appointment.patient_id.to_string(),
            doctor_id: appointment.doctor_id.map(|id| id.to_string()),
            appointment_time: appointment.appointment_time.format(TIME_FORMAT).to_string(),
            reason: text(appointment.reason),
            status: appointment.status.to_string(),
            created_at: timestamp(&appointment.created_at),
        }
    }
}

impl From<Medication> for MedicationDto {
    fn from(line: Medication) -> Self {
        Self {
            medication_name: line.medication_name.into_inner(),
            dosage: line.dosage.into_inner(),
            frequency: line.frequency.into_inner(),
            duration: line.duration.into_inner(),
        }
    }
}

impl From<Prescription> for PrescriptionRes {
    fn from(prescription: Prescription) -> Self {
        Self {
            id: prescription.id.to_string(),
            patient_id: prescription.patient_id.to_string(),
            doctor_id: prescription.doctor_id.to_string(),
            notes: text(prescription.notes),
            medications: prescription
                .medications
                .into_iter()
                .map(MedicationDto::from)
                .collect(),
            created_at: timestamp(&prescription.created_at),
        }
    }
}

impl From<Document> for DocumentRes {
    fn from(document: Document) -> Self {
        Self {
            id: document.id.to_string(),
            patient_id: document.patient_id.to_string(),
            document_name: document.document_name.into_inner(),
            document_type: document.document_type.into_inner(),
            content_hash: document.content_hash.to_string(),
            media_type: text(document.media_type),
            size_bytes: document.size_bytes,
            uploaded_by: document.uploaded_by.to_string(),
            uploaded_at: timestamp(&document.uploaded_at),
        }
    }
}

impl From<OpdRow> for OpdRowRes {
    fn from(row: OpdRow) -> Self {
        Self {
            appointment_id: row.appointment_id.to_string(),
            appointment_time: row.appointment_time.format(TIME_FORMAT).to_string(),
            reason: text(row.reason),
            status: row.status.to_string(),
            patient_id: row.patient_id.to_string(),
            patient_name: row.patient_name,
            doctor_id: row.doctor_id.to_string(),
            doctor_name: row.doctor_name,
        }
    }
}

impl From<IpdRow> for IpdRowRes {
    fn from(row: IpdRow) -> Self {
        Self {
            admission_id: row.admission_id.to_string(),
            patient_id: row.patient_id.to_string(),
            patient_name: row.patient_name,
            admitting_doctor_id: row.admitting_doctor_id.to_string(),
            doctor_name: row.doctor_name,
            room_number: row.room_number.into_inner(),
            status: row.status.to_string(),
            admission_date: timestamp(&row.admission_date),
        }
    }
}

// --- requests ---------------------------------------------------------------

impl TryFrom<SignupReq> for Signup {
    type Error = CoreError;

    fn try_from(req: SignupReq) -> CoreResult<Self> {
        Ok(Self {
            email: EmailAddress::parse(&req.email)?,
            password: req.password,
            full_name: required("full_name", &req.full_name)?,
            role: req.role.parse()?,
            specialization: NonEmptyText::optional(req.specialization),
        })
    }
}

impl TryFrom<RegisterPatientReq> for NewPatient {
    type Error = CoreError;

    fn try_from(req: RegisterPatientReq) -> CoreResult<Self> {
        let triage_level = match req.triage_level.as_deref().map(str::trim) {
            Some(level) if !level.is_empty() => Some(level.parse::<TriageLevel>()?),
            _ => None,
        };
        Ok(Self {
            user_id: optional_id("user_id", req.user_id.as_deref())?,
            first_name: required("first_name", &req.first_name)?,
            last_name: required("last_name", &req.last_name)?,
            date_of_birth: parse_date("date_of_birth", &req.date_of_birth)?,
            gender: required("gender", &req.gender)?,
            phone_number: NonEmptyText::optional(req.phone_number),
            address: NonEmptyText::optional(req.address),
            presenting_complaint: NonEmptyText::optional(req.presenting_complaint),
            triage_level,
        })
    }
}

impl TryFrom<StaffReq> for NewStaff {
    type Error = CoreError;

    fn try_from(req: StaffReq) -> CoreResult<Self> {
        let role: Role = req.role.parse()?;
        Ok(Self {
            first_name: required("first_name", &req.first_name)?,
            last_name: required("last_name", &req.last_name)?,
            role,
            specialization: NonEmptyText::optional(req.specialization),
        })
    }
}

impl TryFrom<BedReq> for NewBed {
    type Error = CoreError;

    fn try_from(req: BedReq) -> CoreResult<Self> {
        Ok(Self {
            bed_number: required("bed_number", &req.bed_number)?,
            ward: NonEmptyText::optional(req.ward),
        })
    }
}

impl TryFrom<AppointmentReq> for NewAppointment {
    type Error = CoreError;

    fn try_from(req: AppointmentReq) -> CoreResult<Self> {
        Ok(Self {
            patient_id: parse_id("patient_id", &req.patient_id)?,
            doctor_id: optional_id("doctor_id", req.doctor_id.as_deref())?,
            appointment_time: parse_appointment_time(&req.appointment_time)?,
            reason: NonEmptyText::optional(req.reason),
        })
    }
}

impl TryFrom<MedicationDto> for Medication {
    type Error = CoreError;

    fn try_from(line: MedicationDto) -> CoreResult<Self> {
        Ok(Self {
            medication_name: required("medication_name", &line.medication_name)?,
            dosage: required("dosage", &line.dosage)?,
            frequency: required("frequency", &line.frequency)?,
            duration: required("duration", &line.duration)?,
        })
    }
}

impl TryFrom<PrescriptionReq> for NewPrescription {
    type Error = CoreError;

    fn try_from(req: PrescriptionReq) -> CoreResult<Self> {
        Ok(Self {
            patient_id: parse_id("patient_id", &req.patient_id)?,
            notes: NonEmptyText::optional(req.notes),
            medications: req
                .medications
                .into_iter()
                .map(Medication::try_from)
                .collect::<CoreResult<_>>()?,
        })
    }
}
