//! Cross-entity read views: the outpatient (OPD) day list and the inpatient (IPD) roster.
//!
//! Both read committed state at call time and denormalise patient and doctor display names.

use crate::access::{authorize, Actor, Capability};
use crate::db::{opt_text_column, parsed_column, text_column};
use crate::model::{AdmissionStatus, AppointmentStatus};
use crate::{CoreError, CoreResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use multicare_types::NonEmptyText;
use multicare_uuid::ShardableUuid;
use rusqlite::{params, Connection, Row};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpdRow {
    pub appointment_id: ShardableUuid,
    pub appointment_time: NaiveDateTime,
    pub reason: Option<NonEmptyText>,
    pub status: AppointmentStatus,
    pub patient_id: ShardableUuid,
    pub patient_name: String,
    pub doctor_id: ShardableUuid,
    pub doctor_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IpdRow {
    pub admission_id: ShardableUuid,
    pub patient_id: ShardableUuid,
    pub patient_name: String,
    pub admitting_doctor_id: ShardableUuid,
    pub doctor_name: String,
    pub room_number: NonEmptyText,
    pub status: AdmissionStatus,
    pub admission_date: DateTime<Utc>,
}

fn display_name(row: &Row<'_>, first: usize) -> rusqlite::Result<String> {
    Ok(format!(
        "{} {}",
        text_column(row, first)?,
        text_column(row, first + 1)?
    ))
}

/// Appointments on `date` that have a doctor, in time order.
pub fn opd_by_date(conn: &Connection, actor: &Actor, date: NaiveDate) -> CoreResult<Vec<OpdRow>> {
    authorize(actor, Capability::Staff)?;
    let mut stmt = conn.prepare(
        "SELECT a.id, a.appointment_time, a.reason, a.status,
                p.id, p.first_name, p.last_name,
                s.id, s.first_name, s.last_name
         FROM appointments a
         JOIN patients p ON p.id = a.patient_id
         JOIN staff s ON s.id = a.doctor_id
         WHERE date(a.appointment_time) = ?1
         ORDER BY a.appointment_time, a.rowid",
    )?;
    let rows = stmt.query_map(params![date.format("%Y-%m-%d").to_string()], |row| {
        Ok(OpdRow {
            appointment_id: parsed_column(row, 0)?,
            appointment_time: parsed_column(row, 1)?,
            reason: opt_text_column(row, 2)?,
            status: parsed_column(row, 3)?,
            patient_id: parsed_column(row, 4)?,
            patient_name: display_name(row, 5)?,
            doctor_id: parsed_column(row, 7)?,
            doctor_name: display_name(row, 8)?,
        })
    })?;
    rows.map(|r| r.map_err(CoreError::from)).collect()
}

/// Admissions currently `Admitted`, oldest first.
pub fn ipd_active(conn: &Connection, actor: &Actor) -> CoreResult<Vec<IpdRow>> {
    authorize(actor, Capability::Staff)?;
    let mut stmt = conn.prepare(
        "SELECT ad.id, p.id, p.first_name, p.last_name,
                s.id, s.first_name, s.last_name,
                ad.room_number, ad.status, ad.admission_date
         FROM admissions ad
         JOIN patients p ON p.id = ad.patient_id
         JOIN staff s ON s.id = ad.admitting_doctor_id
         WHERE ad.status = ?1
         ORDER BY ad.admission_date, ad.rowid",
    )?;
    let rows = stmt.query_map(params![AdmissionStatus::Admitted.as_str()], |row| {
        Ok(IpdRow {
            admission_id: parsed_column(row, 0)?,
            patient_id: parsed_column(row, 1)?,
            patient_name: display_name(row, 2)?,
            admitting_doctor_id: parsed_column(row, 4)?,
            doctor_name: display_name(row, 5)?,
            room_number: text_column(row, 7)?,
            status: parsed_column(row, 8)?,
            admission_date: parsed_column(row, 9)?,
        })
    })?;
    rows.map(|r| r.map_err(CoreError::from)).collect()
}
