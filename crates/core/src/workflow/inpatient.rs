//! Admissions and bed occupancy.
//!
//! An admission starts `Admitted` and moves once, to `Discharged` or `Transferred`. Leaving the
//! `Admitted` state frees the patient's bed in the same transaction. A patient holds at most
//! one bed; assigning a new one clears the old.

use crate::access::{authorize, Actor, Capability};
use crate::constants::TRANSFER_ROOM_PREFIX;
use crate::db::{begin_write, now};
use crate::model::{Admission, AdmissionStatus, Bed, NewBed, Page};
use crate::repositories::{admissions, beds, patients, staff};
use crate::{CoreError, CoreResult};
use multicare_types::NonEmptyText;
use multicare_uuid::ShardableUuid;
use rusqlite::Connection;

/// Admits a patient under the calling doctor.
///
/// # Errors
///
/// - `Forbidden` unless the actor is a doctor.
/// - `NotFound` for an unknown patient, or if the actor has no doctor directory entry.
/// - `Conflict` if the patient is already admitted.
pub fn admit(
    conn: &mut Connection,
    actor: &Actor,
    patient_id: &ShardableUuid,
    room_number: NonEmptyText,
) -> CoreResult<Admission> {
    authorize(actor, Capability::DoctorOnly)?;

    let tx = begin_write(conn)?;
    patients::get(&tx, patient_id)?;
    let doctor = staff::get_doctor(&tx, &actor.user_id)?;
    if let Some(active) = admissions::find_active_for_patient(&tx, patient_id)? {
        return Err(CoreError::Conflict(format!(
            "patient {patient_id} is already admitted (admission {})",
            active.id
        )));
    }

    let admitted_at = now();
    let admission = Admission {
        id: ShardableUuid::new(),
        patient_id: patient_id.clone(),
        admitting_doctor_id: doctor.id,
        room_number,
        status: AdmissionStatus::Admitted,
        admission_date: admitted_at,
        updated_at: admitted_at,
    };
    admissions::insert(&tx, &admission)?;
    tx.commit()?;

    tracing::info!(admission_id = %admission.id, patient_id = %patient_id, "patient admitted");
    Ok(admission)
}

/// Moves an `Admitted` admission to `status`, optionally rewriting the room, and frees the
/// patient's bed.
fn leave_admitted(
    conn: &mut Connection,
    admission_id: &ShardableUuid,
    status: AdmissionStatus,
    room_number: Option<String>,
) -> CoreResult<Admission> {
    let tx = begin_write(conn)?;
    let current = admissions::get(&tx, admission_id)?;
    if current.status != AdmissionStatus::Admitted {
        return Err(CoreError::Conflict(format!(
            "admission {admission_id} is {}; only Admitted admissions can be {}",
            current.status,
            status.as_str().to_lowercase()
        )));
    }

    let room = room_number.unwrap_or_else(|| current.room_number.as_str().to_owned());
    admissions::update_status(&tx, admission_id, status, &room, &now())?;
    let released = beds::release_for_patient(&tx, &current.patient_id)?;
    let updated = admissions::get(&tx, admission_id)?;
    tx.commit()?;

    tracing::info!(
        admission_id = %admission_id,
        status = %status,
        bed_released = released,
        "admission closed"
    );
    Ok(updated)
}

/// `Admitted` → `Discharged`. Any other current status fails with `Conflict`.
pub fn discharge(
    conn: &mut Connection,
    actor: &Actor,
    admission_id: &ShardableUuid,
) -> CoreResult<Admission> {
    authorize(actor, Capability::Staff)?;
    leave_admitted(conn, admission_id, AdmissionStatus::Discharged, None)
}

/// `Admitted` → `Transferred`, with the room rewritten to `Dept-<new_department_id>`.
pub fn transfer(
    conn: &mut Connection,
    actor: &Actor,
    admission_id: &ShardableUuid,
    new_department_id: u32,
) -> CoreResult<Admission> {
    authorize(actor, Capability::Staff)?;
    leave_admitted(
        conn,
        admission_id,
        AdmissionStatus::Transferred,
        Some(format!("{TRANSFER_ROOM_PREFIX}{new_department_id}")),
    )
}

pub fn add_bed(conn: &mut Connection, actor: &Actor, new: NewBed) -> CoreResult<Bed> {
    authorize(actor, Capability::Staff)?;
    let bed = Bed {
        id: ShardableUuid::new(),
        bed_number: new.bed_number,
        ward: new.ward,
        is_occupied: false,
        patient_id: None,
    };
    let tx = begin_write(conn)?;
    beds::insert(&tx, &bed)?;
    tx.commit()?;
    Ok(bed)
}

pub fn list_beds(conn: &Connection, actor: &Actor, page: Page) -> CoreResult<Vec<Bed>> {
    authorize(actor, Capability::Staff)?;
    beds::list(conn, page)
}

/// Requested bed state. `is_occupied`, when supplied, must agree with `patient_id`.
#[derive(Debug, Clone, Default)]
pub struct BedAssignment {
    pub is_occupied: Option<bool>,
    pub patient_id: Option<ShardableUuid>,
}

/// Assigns a bed to a patient, or frees it when `patient_id` is `None`.
///
/// Any other bed the patient holds is freed in the same transaction.
///
/// # Errors
///
/// - `InvalidInput` if `is_occupied` contradicts `patient_id`.
/// - `NotFound` for an unknown bed or patient.
/// - `Conflict` if the bed is held by a different patient.
pub fn assign_bed(
    conn: &mut Connection,
    actor: &Actor,
    bed_id: &ShardableUuid,
    assignment: BedAssignment,
) -> CoreResult<Bed> {
    authorize(actor, Capability::Staff)?;
    if let Some(flag) = assignment.is_occupied {
        if flag != assignment.patient_id.is_some() {
            return Err(CoreError::InvalidInput(
                "is_occupied must be true exactly when patient_id is set".into(),
            ));
        }
    }

    let tx = begin_write(conn)?;
    let bed = beds::get(&tx, bed_id)?;
    match &assignment.patient_id {
        Some(patient_id) => {
            patients::get(&tx, patient_id)?;
            if let Some(holder) = &bed.patient_id {
                if holder != patient_id {
                    return Err(CoreError::Conflict(format!(
                        "bed {} is occupied by another patient",
                        bed.bed_number
                    )));
                }
            }
            beds::release_for_patient(&tx, patient_id)?;
            beds::set_occupant(&tx, bed_id, Some(patient_id))?;
        }
        None => beds::set_occupant(&tx, bed_id, None)?,
    }
    let updated = beds::get(&tx, bed_id)?;
    tx.commit()?;

    tracing::info!(
        bed_id = %bed_id,
        occupied = updated.is_occupied,
        "bed assignment updated"
    );
    Ok(updated)
}
