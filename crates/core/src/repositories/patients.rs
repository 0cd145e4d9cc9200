use crate::db::{opt_parsed_column, opt_str, opt_text_column, parsed_column, text_column, timestamp};
use crate::model::{Page, Patient, TriageLevel};
use crate::{CoreError, CoreResult};
use multicare_uuid::ShardableUuid;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const COLUMNS: &str = "id, user_id, first_name, last_name, date_of_birth, gender, phone_number, \
                       address, presenting_complaint, triage_level, registered_by, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: parsed_column(row, 0)?,
        user_id: opt_parsed_column(row, 1)?,
        first_name: text_column(row, 2)?,
        last_name: text_column(row, 3)?,
        date_of_birth: parsed_column(row, 4)?,
        gender: text_column(row, 5)?,
        phone_number: opt_text_column(row, 6)?,
        address: opt_text_column(row, 7)?,
        presenting_complaint: opt_text_column(row, 8)?,
        triage_level: opt_parsed_column(row, 9)?,
        registered_by: opt_parsed_column(row, 10)?,
        created_at: parsed_column(row, 11)?,
    })
}

/// Inserts a patient. A second patient for the same `user_id` fails with `DuplicateKey`.
pub fn insert(conn: &Connection, patient: &Patient) -> CoreResult<()> {
    conn.execute(
        &format!("INSERT INTO patients ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"),
        params![
            patient.id.to_string(),
            patient.user_id.as_ref().map(|u| u.to_string()),
            patient.first_name.as_str(),
            patient.last_name.as_str(),
            patient.date_of_birth.format("%Y-%m-%d").to_string(),
            patient.gender.as_str(),
            opt_str(&patient.phone_number),
            opt_str(&patient.address),
            opt_str(&patient.presenting_complaint),
            patient.triage_level.map(|t| t.as_str()),
            patient.registered_by.as_ref().map(|u| u.to_string()),
            timestamp(&patient.created_at),
        ],
    )
    .map_err(|e| match CoreError::from(e) {
        CoreError::DuplicateKey(_) => {
            CoreError::DuplicateKey("A patient is already registered for this user_id".into())
        }
        other => other,
    })?;
    Ok(())
}

pub fn get(conn: &Connection, id: &ShardableUuid) -> CoreResult<Patient> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM patients WHERE id = ?1"),
        params![id.to_string()],
        from_row,
    )
    .optional()?
    .ok_or_else(|| CoreError::not_found("patient", id))
}

pub fn exists(conn: &Connection, id: &ShardableUuid) -> CoreResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM patients WHERE id = ?1",
            params![id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Patients in registration order.
pub fn list(conn: &Connection, page: Page) -> CoreResult<Vec<Patient>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM patients ORDER BY created_at, rowid LIMIT ?1 OFFSET ?2"
    ))?;
    let rows = stmt.query_map(params![page.limit, page.skip], from_row)?;
    rows.map(|r| r.map_err(CoreError::from)).collect()
}

/// Overwrites the triage level. Returns false if no such patient exists.
pub fn update_triage(
    conn: &Connection,
    id: &ShardableUuid,
    level: Option<TriageLevel>,
) -> CoreResult<bool> {
    let changed = conn.execute(
        "UPDATE patients SET triage_level = ?2 WHERE id = ?1",
        params![id.to_string(), level.map(|l| l.as_str())],
    )?;
    Ok(changed == 1)
}

/// Patients whose current triage level is one of `levels`, in registration order.
pub fn list_by_triage(conn: &Connection, levels: &[TriageLevel]) -> CoreResult<Vec<Patient>> {
    if levels.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; levels.len()].join(", ");
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM patients WHERE triage_level IN ({placeholders}) \
         ORDER BY created_at, rowid"
    ))?;
    let rows = stmt.query_map(params_from_iter(levels.iter().map(|l| l.as_str())), from_row)?;
    rows.map(|r| r.map_err(CoreError::from)).collect()
}
