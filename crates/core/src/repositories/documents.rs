use crate::db::{opt_str, opt_text_column, parsed_column, text_column, timestamp};
use crate::model::Document;
use crate::{CoreError, CoreResult};
use multicare_uuid::ShardableUuid;
use rusqlite::{params, Connection, OptionalExtension, Row};

const COLUMNS: &str = "id, patient_id, document_name, document_type, storage_path, content_hash, \
                       media_type, size_bytes, uploaded_by, uploaded_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Document> {
    let size: i64 = row.get(7)?;
    Ok(Document {
        id: parsed_column(row, 0)?,
        patient_id: parsed_column(row, 1)?,
        document_name: text_column(row, 2)?,
        document_type: text_column(row, 3)?,
        storage_path: text_column(row, 4)?,
        content_hash: parsed_column(row, 5)?,
        media_type: opt_text_column(row, 6)?,
        size_bytes: u64::try_from(size).unwrap_or_default(),
        uploaded_by: parsed_column(row, 8)?,
        uploaded_at: parsed_column(row, 9)?,
    })
}

pub fn insert(conn: &Connection, document: &Document) -> CoreResult<()> {
    conn.execute(
        &format!("INSERT INTO documents ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
        params![
            document.id.to_string(),
            document.patient_id.to_string(),
            document.document_name.as_str(),
            document.document_type.as_str(),
            document.storage_path.as_str(),
            document.content_hash.as_str(),
            opt_str(&document.media_type),
            i64::try_from(document.size_bytes).unwrap_or(i64::MAX),
            document.uploaded_by.to_string(),
            timestamp(&document.uploaded_at),
        ],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, id: &ShardableUuid) -> CoreResult<Document> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM documents WHERE id = ?1"),
        params![id.to_string()],
        from_row,
    )
    .optional()?
    .ok_or_else(|| CoreError::not_found("document", id))
}

/// A patient's documents in upload order.
pub fn list_for_patient(conn: &Connection, patient_id: &ShardableUuid) -> CoreResult<Vec<Document>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM documents WHERE patient_id = ?1 ORDER BY uploaded_at, rowid"
    ))?;
    let rows = stmt.query_map(params![patient_id.to_string()], from_row)?;
    rows.map(|r| r.map_err(CoreError::from)).collect()
}
