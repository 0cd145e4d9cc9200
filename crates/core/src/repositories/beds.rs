use crate::db::{opt_parsed_column, opt_str, opt_text_column, parsed_column, text_column};
use crate::model::{Bed, Page};
use crate::{CoreError, CoreResult};
use multicare_uuid::ShardableUuid;
use rusqlite::{params, Connection, OptionalExtension, Row};

const COLUMNS: &str = "id, bed_number, ward, is_occupied, patient_id";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Bed> {
    Ok(Bed {
        id: parsed_column(row, 0)?,
        bed_number: text_column(row, 1)?,
        ward: opt_text_column(row, 2)?,
        is_occupied: row.get(3)?,
        patient_id: opt_parsed_column(row, 4)?,
    })
}

/// Inserts a bed. A repeated `bed_number` fails with `DuplicateKey`.
pub fn insert(conn: &Connection, bed: &Bed) -> CoreResult<()> {
    conn.execute(
        &format!("INSERT INTO beds ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
        params![
            bed.id.to_string(),
            bed.bed_number.as_str(),
            opt_str(&bed.ward),
            bed.is_occupied,
            bed.patient_id.as_ref().map(|p| p.to_string()),
        ],
    )
    .map_err(|e| match CoreError::from(e) {
        CoreError::DuplicateKey(_) => CoreError::DuplicateKey(format!(
            "Bed number already exists: {}",
            bed.bed_number
        )),
        other => other,
    })?;
    Ok(())
}

pub fn get(conn: &Connection, id: &ShardableUuid) -> CoreResult<Bed> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM beds WHERE id = ?1"),
        params![id.to_string()],
        from_row,
    )
    .optional()?
    .ok_or_else(|| CoreError::not_found("bed", id))
}

pub fn list(conn: &Connection, page: Page) -> CoreResult<Vec<Bed>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM beds ORDER BY bed_number, rowid LIMIT ?1 OFFSET ?2"
    ))?;
    let rows = stmt.query_map(params![page.limit, page.skip], from_row)?;
    rows.map(|r| r.map_err(CoreError::from)).collect()
}

pub fn find_by_patient(conn: &Connection, patient_id: &ShardableUuid) -> CoreResult<Option<Bed>> {
    Ok(conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM beds WHERE patient_id = ?1"),
            params![patient_id.to_string()],
            from_row,
        )
        .optional()?)
}

/// Sets or clears the occupant. Occupancy is derived from `patient_id` so the two never
/// disagree.
pub fn set_occupant(
    conn: &Connection,
    bed_id: &ShardableUuid,
    patient_id: Option<&ShardableUuid>,
) -> CoreResult<()> {
    conn.execute(
        "UPDATE beds SET is_occupied = ?2, patient_id = ?3 WHERE id = ?1",
        params![
            bed_id.to_string(),
            patient_id.is_some(),
            patient_id.map(|p| p.to_string()),
        ],
    )?;
    Ok(())
}

/// Frees whichever bed the patient holds. Returns true if a bed was released.
pub fn release_for_patient(conn: &Connection, patient_id: &ShardableUuid) -> CoreResult<bool> {
    let changed = conn.execute(
        "UPDATE beds SET is_occupied = 0, patient_id = NULL WHERE patient_id = ?1",
        params![patient_id.to_string()],
    )?;
    Ok(changed > 0)
}
