use crate::db::{opt_parsed_column, opt_str, opt_text_column, parsed_column, timestamp};
use crate::model::{Appointment, AppointmentStatus, Page};
use crate::{CoreError, CoreResult};
use multicare_uuid::ShardableUuid;
use rusqlite::{params, Connection, OptionalExtension, Row};

const COLUMNS: &str = "id, patient_id, doctor_id, appointment_time, reason, status, created_at";

/// Storage and wire format for local appointment times.
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: parsed_column(row, 0)?,
        patient_id: parsed_column(row, 1)?,
        doctor_id: opt_parsed_column(row, 2)?,
        appointment_time: parsed_column(row, 3)?,
        reason: opt_text_column(row, 4)?,
        status: parsed_column(row, 5)?,
        created_at: parsed_column(row, 6)?,
    })
}

pub fn insert(conn: &Connection, appointment: &Appointment) -> CoreResult<()> {
    conn.execute(
        &format!("INSERT INTO appointments ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
        params![
            appointment.id.to_string(),
            appointment.patient_id.to_string(),
            appointment.doctor_id.as_ref().map(|d| d.to_string()),
            appointment.appointment_time.format(TIME_FORMAT).to_string(),
            opt_str(&appointment.reason),
            appointment.status.as_str(),
            timestamp(&appointment.created_at),
        ],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, id: &ShardableUuid) -> CoreResult<Appointment> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM appointments WHERE id = ?1"),
        params![id.to_string()],
        from_row,
    )
    .optional()?
    .ok_or_else(|| CoreError::not_found("appointment", id))
}

/// Appointments in time order.
pub fn list(conn: &Connection, page: Page) -> CoreResult<Vec<Appointment>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM appointments ORDER BY appointment_time, rowid LIMIT ?1 OFFSET ?2"
    ))?;
    let rows = stmt.query_map(params![page.limit, page.skip], from_row)?;
    rows.map(|r| r.map_err(CoreError::from)).collect()
}

pub fn count(conn: &Connection) -> CoreResult<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM appointments", [], |row| row.get(0))?)
}

pub fn set_status(
    conn: &Connection,
    id: &ShardableUuid,
    status: AppointmentStatus,
) -> CoreResult<()> {
    conn.execute(
        "UPDATE appointments SET status = ?2 WHERE id = ?1",
        params![id.to_string(), status.as_str()],
    )?;
    Ok(())
}
