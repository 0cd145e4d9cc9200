//! Prescriptions.

use crate::access::{authorize, Actor, Capability};
use crate::db::{begin_write, now};
use crate::model::{NewPrescription, Prescription};
use crate::repositories::{patients, prescriptions};
use crate::{CoreError, CoreResult};
use multicare_uuid::ShardableUuid;
use rusqlite::Connection;

/// Writes a prescription and all its medication lines, or nothing.
///
/// The prescribing doctor is always the caller.
///
/// # Errors
///
/// - `Forbidden` unless the actor is a doctor.
/// - `InvalidInput` if no medication is given.
/// - `NotFound` for an unknown patient.
pub fn create_prescription(
    conn: &mut Connection,
    actor: &Actor,
    new: NewPrescription,
) -> CoreResult<Prescription> {
    authorize(actor, Capability::DoctorOnly)?;
    if new.medications.is_empty() {
        return Err(CoreError::InvalidInput(
            "a prescription needs at least one medication".into(),
        ));
    }

    let prescription = Prescription {
        id: ShardableUuid::new(),
        patient_id: new.patient_id,
        doctor_id: actor.user_id.clone(),
        notes: new.notes,
        medications: new.medications,
        created_at: now(),
    };

    let tx = begin_write(conn)?;
    patients::get(&tx, &prescription.patient_id)?;
    prescriptions::insert(&tx, &prescription)?;
    tx.commit()?;

    tracing::info!(
        prescription_id = %prescription.id,
        patient_id = %prescription.patient_id,
        lines = prescription.medications.len(),
        "prescription created"
    );
    Ok(prescription)
}

pub fn prescriptions_for_patient(
    conn: &Connection,
    actor: &Actor,
    patient_id: &ShardableUuid,
) -> CoreResult<Vec<Prescription>> {
    authorize(actor, Capability::Staff)?;
    patients::get(conn, patient_id)?;
    prescriptions::list_for_patient(conn, patient_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Medication;
    use crate::workflow::test_support::Fixture;
    use multicare_types::NonEmptyText;

    fn text(s: &str) -> NonEmptyText {
        NonEmptyText::new(s).unwrap()
    }

    fn amoxicillin() -> Medication {
        Medication {
            medication_name: text("Amoxicillin"),
            dosage: text("500mg"),
            frequency: text("TID"),
            duration: text("7 days"),
        }
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_nurse_is_forbidden_doctor_succeeds() {
        let mut fx = Fixture::new();
        let doctor = fx.doctor();
        let nurse = fx.nurse();
        let patient = fx.patient("Rx", "Patient");
        let new = NewPrescription {
            patient_id: patient.id.clone(),
            notes: NonEmptyText::optional(Some("after meals")),
            medications: vec![amoxicillin()],
        };

        assert!(matches!(
            create_prescription(&mut fx.conn, &nurse, new.clone()),
            Err(CoreError::Forbidden(_))
        ));
        assert_eq!(count(&fx.conn, "prescriptions"), 0);

        let created = create_prescription(&mut fx.conn, &doctor, new).unwrap();
        assert_eq!(created.doctor_id, doctor.user_id);

        let listed = prescriptions_for_patient(&fx.conn, &nurse, &patient.id).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].medications, vec![amoxicillin()]);
        assert_eq!(listed[0].notes.as_ref().map(|n| n.as_str()), Some("after meals"));
    }

    #[test]
    fn test_unknown_patient_leaves_no_rows() {
        let mut fx = Fixture::new();
        let doctor = fx.doctor();
        let result = create_prescription(
            &mut fx.conn,
            &doctor,
            NewPrescription {
                patient_id: ShardableUuid::new(),
                notes: None,
                medications: vec![amoxicillin(), amoxicillin()],
            },
        );
        assert!(matches!(result, Err(CoreError::NotFound { entity: "patient", .. })));
        assert_eq!(count(&fx.conn, "prescriptions"), 0);
        assert_eq!(count(&fx.conn, "prescription_medications"), 0);
    }

    #[test]
    fn test_failed_medication_insert_rolls_back_header() {
        let mut fx = Fixture::new();
        let doctor = fx.doctor();
        let patient = fx.patient("Rolled", "Back");
        fx.conn
            .execute_batch(
                "CREATE TRIGGER reject_second_line BEFORE INSERT ON prescription_medications
                 WHEN NEW.position = 1
                 BEGIN SELECT RAISE(ABORT, 'simulated failure'); END;",
            )
            .unwrap();

        let result = create_prescription(
            &mut fx.conn,
            &doctor,
            NewPrescription {
                patient_id: patient.id.clone(),
                notes: None,
                medications: vec![amoxicillin(), amoxicillin()],
            },
        );
        assert!(matches!(result, Err(CoreError::Database(_))));
        assert_eq!(count(&fx.conn, "prescriptions"), 0);
        assert_eq!(count(&fx.conn, "prescription_medications"), 0);
    }

    #[test]
    fn test_empty_medication_list_is_invalid() {
        let mut fx = Fixture::new();
        let doctor = fx.doctor();
        let patient = fx.patient("No", "Meds");
        let result = create_prescription(
            &mut fx.conn,
            &doctor,
            NewPrescription {
                patient_id: patient.id,
                notes: None,
                medications: vec![],
            },
        );
        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn test_medication_order_is_preserved() {
        let mut fx = Fixture::new();
        let doctor = fx.doctor();
        let patient = fx.patient("Many", "Meds");
        let mut paracetamol = amoxicillin();
        paracetamol.medication_name = text("Paracetamol");

        let created = create_prescription(
            &mut fx.conn,
            &doctor,
            NewPrescription {
                patient_id: patient.id.clone(),
                notes: None,
                medications: vec![paracetamol.clone(), amoxicillin()],
            },
        )
        .unwrap();

        let stored = prescriptions::get(&fx.conn, &created.id).unwrap();
        assert_eq!(stored.medications, vec![paracetamol, amoxicillin()]);
    }
}
