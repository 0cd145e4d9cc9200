use crate::db::{opt_str, opt_text_column, parsed_column, text_column, timestamp};
use crate::model::{Page, Role, Staff};
use crate::{CoreError, CoreResult};
use multicare_uuid::ShardableUuid;
use rusqlite::{params, Connection, OptionalExtension, Row};

const COLUMNS: &str = "id, first_name, last_name, role, specialization, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Staff> {
    Ok(Staff {
        id: parsed_column(row, 0)?,
        first_name: text_column(row, 1)?,
        last_name: text_column(row, 2)?,
        role: parsed_column(row, 3)?,
        specialization: opt_text_column(row, 4)?,
        created_at: parsed_column(row, 5)?,
    })
}

pub fn insert(conn: &Connection, staff: &Staff) -> CoreResult<()> {
    if !staff.role.is_staff() {
        return Err(CoreError::InvalidInput(format!(
            "staff role must be doctor or nurse, got '{}'",
            staff.role
        )));
    }
    conn.execute(
        &format!("INSERT INTO staff ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
        params![
            staff.id.to_string(),
            staff.first_name.as_str(),
            staff.last_name.as_str(),
            staff.role.as_str(),
            opt_str(&staff.specialization),
            timestamp(&staff.created_at),
        ],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, id: &ShardableUuid) -> CoreResult<Staff> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM staff WHERE id = ?1"),
        params![id.to_string()],
        from_row,
    )
    .optional()?
    .ok_or_else(|| CoreError::not_found("staff member", id))
}

/// Resolves a staff member who must be a doctor. Nurses and unknown ids are both `NotFound`.
pub fn get_doctor(conn: &Connection, id: &ShardableUuid) -> CoreResult<Staff> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM staff WHERE id = ?1 AND role = 'doctor'"),
        params![id.to_string()],
        from_row,
    )
    .optional()?
    .ok_or_else(|| CoreError::not_found("doctor", id))
}

/// Staff ordered by last then first name, optionally restricted to one role.
pub fn list(conn: &Connection, role: Option<Role>, page: Page) -> CoreResult<Vec<Staff>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM staff
         WHERE (?1 IS NULL OR role = ?1)
         ORDER BY last_name, first_name, rowid
         LIMIT ?2 OFFSET ?3"
    ))?;
    let rows = stmt.query_map(
        params![role.map(|r| r.as_str()), page.limit, page.skip],
        from_row,
    )?;
    rows.map(|r| r.map_err(CoreError::from)).collect()
}
