use crate::db::{parsed_column, text_column, timestamp};
use crate::model::{Admission, AdmissionStatus};
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use multicare_uuid::ShardableUuid;
use rusqlite::{params, Connection, OptionalExtension, Row};

const COLUMNS: &str =
    "id, patient_id, admitting_doctor_id, room_number, status, admission_date, updated_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Admission> {
    Ok(Admission {
        id: parsed_column(row, 0)?,
        patient_id: parsed_column(row, 1)?,
        admitting_doctor_id: parsed_column(row, 2)?,
        room_number: text_column(row, 3)?,
        status: parsed_column(row, 4)?,
        admission_date: parsed_column(row, 5)?,
        updated_at: parsed_column(row, 6)?,
    })
}

pub fn insert(conn: &Connection, admission: &Admission) -> CoreResult<()> {
    conn.execute(
        &format!("INSERT INTO admissions ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
        params![
            admission.id.to_string(),
            admission.patient_id.to_string(),
            admission.admitting_doctor_id.to_string(),
            admission.room_number.as_str(),
            admission.status.as_str(),
            timestamp(&admission.admission_date),
            timestamp(&admission.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, id: &ShardableUuid) -> CoreResult<Admission> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM admissions WHERE id = ?1"),
        params![id.to_string()],
        from_row,
    )
    .optional()?
    .ok_or_else(|| CoreError::not_found("admission", id))
}

/// The patient's current `Admitted` admission, if any.
pub fn find_active_for_patient(
    conn: &Connection,
    patient_id: &ShardableUuid,
) -> CoreResult<Option<Admission>> {
    Ok(conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM admissions WHERE patient_id = ?1 AND status = 'Admitted'"),
            params![patient_id.to_string()],
            from_row,
        )
        .optional()?)
}

pub fn list_for_patient(conn: &Connection, patient_id: &ShardableUuid) -> CoreResult<Vec<Admission>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM admissions WHERE patient_id = ?1 ORDER BY admission_date, rowid"
    ))?;
    let rows = stmt.query_map(params![patient_id.to_string()], from_row)?;
    rows.map(|r| r.map_err(CoreError::from)).collect()
}

pub fn update_status(
    conn: &Connection,
    id: &ShardableUuid,
    status: AdmissionStatus,
    room_number: &str,
    updated_at: &DateTime<Utc>,
) -> CoreResult<()> {
    conn.execute(
        "UPDATE admissions SET status = ?2, room_number = ?3, updated_at = ?4 WHERE id = ?1",
        params![id.to_string(), status.as_str(), room_number, timestamp(updated_at)],
    )?;
    Ok(())
}
