use crate::db::{opt_str, opt_text_column, parsed_column, text_column, timestamp};
use crate::model::{Medication, Prescription};
use crate::{CoreError, CoreResult};
use multicare_uuid::ShardableUuid;
use rusqlite::{params, Connection, OptionalExtension, Row};

const COLUMNS: &str = "id, patient_id, doctor_id, notes, created_at";

fn header_from_row(row: &Row<'_>) -> rusqlite::Result<Prescription> {
    Ok(Prescription {
        id: parsed_column(row, 0)?,
        patient_id: parsed_column(row, 1)?,
        doctor_id: parsed_column(row, 2)?,
        notes: opt_text_column(row, 3)?,
        medications: Vec::new(),
        created_at: parsed_column(row, 4)?,
    })
}

fn medication_from_row(row: &Row<'_>) -> rusqlite::Result<Medication> {
    Ok(Medication {
        medication_name: text_column(row, 0)?,
        dosage: text_column(row, 1)?,
        frequency: text_column(row, 2)?,
        duration: text_column(row, 3)?,
    })
}

/// Writes the prescription and its medication lines.
///
/// Not atomic on its own; run it inside a transaction.
pub fn insert(conn: &Connection, prescription: &Prescription) -> CoreResult<()> {
    conn.execute(
        &format!("INSERT INTO prescriptions ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
        params![
            prescription.id.to_string(),
            prescription.patient_id.to_string(),
            prescription.doctor_id.to_string(),
            opt_str(&prescription.notes),
            timestamp(&prescription.created_at),
        ],
    )?;

    let mut stmt = conn.prepare(
        "INSERT INTO prescription_medications
            (id, prescription_id, medication_name, dosage, frequency, duration, position)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for (position, med) in prescription.medications.iter().enumerate() {
        stmt.execute(params![
            ShardableUuid::new().to_string(),
            prescription.id.to_string(),
            med.medication_name.as_str(),
            med.dosage.as_str(),
            med.frequency.as_str(),
            med.duration.as_str(),
            position as i64,
        ])?;
    }
    Ok(())
}

fn load_medications(conn: &Connection, prescription_id: &ShardableUuid) -> CoreResult<Vec<Medication>> {
    let mut stmt = conn.prepare(
        "SELECT medication_name, dosage, frequency, duration
         FROM prescription_medications WHERE prescription_id = ?1 ORDER BY position",
    )?;
    let rows = stmt.query_map(params![prescription_id.to_string()], medication_from_row)?;
    rows.map(|r| r.map_err(CoreError::from)).collect()
}

pub fn get(conn: &Connection, id: &ShardableUuid) -> CoreResult<Prescription> {
    let mut prescription = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM prescriptions WHERE id = ?1"),
            params![id.to_string()],
            header_from_row,
        )
        .optional()?
        .ok_or_else(|| CoreError::not_found("prescription", id))?;
    prescription.medications = load_medications(conn, &prescription.id)?;
    Ok(prescription)
}

/// A patient's prescriptions, newest first.
pub fn list_for_patient(conn: &Connection, patient_id: &ShardableUuid) -> CoreResult<Vec<Prescription>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM prescriptions WHERE patient_id = ?1 ORDER BY created_at DESC, rowid DESC"
    ))?;
    let headers = stmt
        .query_map(params![patient_id.to_string()], header_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    headers
        .into_iter()
        .map(|mut p| {
            p.medications = load_medications(conn, &p.id)?;
            Ok(p)
        })
        .collect()
}
