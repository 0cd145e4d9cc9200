//! Patient registration and triage.

use crate::access::{authorize, Actor, Capability};
use crate::db::{begin_write, now};
use crate::model::{NewPatient, Page, Patient, TriageLevel};
use crate::repositories::{patients, users};
use crate::{CoreError, CoreResult};
use multicare_uuid::ShardableUuid;
use rusqlite::Connection;

/// Registers a patient. Open to anonymous callers; an authenticated caller is recorded as
/// `registered_by`.
///
/// # Errors
///
/// - `NotFound` if `user_id` names no account.
/// - `DuplicateKey` if a patient already exists for that `user_id`.
pub fn register_patient(
    conn: &mut Connection,
    actor: Option<&Actor>,
    new: NewPatient,
) -> CoreResult<Patient> {
    let patient = Patient {
        id: ShardableUuid::new(),
        user_id: new.user_id,
        first_name: new.first_name,
        last_name: new.last_name,
        date_of_birth: new.date_of_birth,
        gender: new.gender,
        phone_number: new.phone_number,
        address: new.address,
        presenting_complaint: new.presenting_complaint,
        triage_level: new.triage_level,
        registered_by: actor.map(|a| a.user_id.clone()),
        created_at: now(),
    };

    let tx = begin_write(conn)?;
    if let Some(user_id) = &patient.user_id {
        users::get(&tx, user_id)?;
    }
    patients::insert(&tx, &patient)?;
    tx.commit()?;

    tracing::info!(patient_id = %patient.id, "patient registered");
    Ok(patient)
}

pub fn list_patients(conn: &Connection, actor: &Actor, page: Page) -> CoreResult<Vec<Patient>> {
    authorize(actor, Capability::Staff)?;
    patients::list(conn, page)
}

pub fn get_patient(conn: &Connection, actor: &Actor, id: &ShardableUuid) -> CoreResult<Patient> {
    authorize(actor, Capability::Staff)?;
    patients::get(conn, id)
}

/// Overwrites a patient's triage level. No history is kept.
pub fn set_triage(
    conn: &mut Connection,
    actor: &Actor,
    patient_id: &ShardableUuid,
    level: TriageLevel,
) -> CoreResult<Patient> {
    authorize(actor, Capability::Staff)?;

    let tx = begin_write(conn)?;
    if !patients::update_triage(&tx, patient_id, Some(level))? {
        return Err(CoreError::not_found("patient", patient_id));
    }
    let patient = patients::get(&tx, patient_id)?;
    tx.commit()?;

    tracing::info!(patient_id = %patient_id, level = %level, "triage updated");
    Ok(patient)
}

/// Patients currently triaged Resuscitation or Emergency, in registration order.
pub fn high_priority_alerts(conn: &Connection, actor: &Actor) -> CoreResult<Vec<Patient>> {
    authorize(actor, Capability::Staff)?;
    patients::list_by_triage(conn, &TriageLevel::HIGH_PRIORITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use crate::workflow::test_support::{new_patient, Fixture};

    #[test]
    fn test_triage_controls_alert_membership() {
        let mut fx = Fixture::new();
        let nurse = fx.nurse();
        let p1 = fx.patient("Ada", "Lovelace");
        assert_eq!(p1.triage_level, None);

        set_triage(&mut fx.conn, &nurse, &p1.id, TriageLevel::Emergency).unwrap();
        let alerts = high_priority_alerts(&fx.conn, &nurse).unwrap();
        assert!(alerts.iter().any(|p| p.id == p1.id));

        let updated = set_triage(&mut fx.conn, &nurse, &p1.id, TriageLevel::NonUrgent).unwrap();
        assert_eq!(updated.triage_level, Some(TriageLevel::NonUrgent));
        let alerts = high_priority_alerts(&fx.conn, &nurse).unwrap();
        assert!(alerts.iter().all(|p| p.id != p1.id));
    }

    #[test]
    fn test_registered_patient_matches_read_back() {
        let mut fx = Fixture::new();
        let nurse = fx.nurse();
        let registered = fx.patient("Grace", "Hopper");
        assert_eq!(get_patient(&fx.conn, &nurse, &registered.id).unwrap(), registered);
    }

    #[test]
    fn test_every_level_round_trips_and_matches_alert_rule() {
        let mut fx = Fixture::new();
        let doctor = fx.doctor();
        let patient = fx.patient("Alan", "Turing");

        for level in TriageLevel::ALL {
            set_triage(&mut fx.conn, &doctor, &patient.id, *level).unwrap();
            let read = get_patient(&fx.conn, &doctor, &patient.id).unwrap();
            assert_eq!(read.triage_level, Some(*level));

            let alerted = high_priority_alerts(&fx.conn, &doctor)
                .unwrap()
                .iter()
                .any(|p| p.id == patient.id);
            assert_eq!(alerted, level.is_high_priority(), "{level}");
        }
    }

    #[test]
    fn test_set_triage_unknown_patient_is_not_found_and_changes_nothing() {
        let mut fx = Fixture::new();
        let nurse = fx.nurse();
        let existing = fx.patient("Mary", "Seacole");

        let result = set_triage(&mut fx.conn, &nurse, &ShardableUuid::new(), TriageLevel::Emergency);
        assert!(matches!(result, Err(CoreError::NotFound { entity: "patient", .. })));

        let unchanged = get_patient(&fx.conn, &nurse, &existing.id).unwrap();
        assert_eq!(unchanged.triage_level, None);
        assert!(high_priority_alerts(&fx.conn, &nurse).unwrap().is_empty());
    }

    #[test]
    fn test_alerts_follow_registration_order() {
        let mut fx = Fixture::new();
        let nurse = fx.nurse();
        let first = fx.patient("First", "Patient");
        let second = fx.patient("Second", "Patient");

        set_triage(&mut fx.conn, &nurse, &second.id, TriageLevel::Resuscitation).unwrap();
        set_triage(&mut fx.conn, &nurse, &first.id, TriageLevel::Emergency).unwrap();

        let ids: Vec<_> = high_priority_alerts(&fx.conn, &nurse)
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[test]
    fn test_patients_cannot_triage_or_list() {
        let mut fx = Fixture::new();
        let patient_user = fx.actor(Role::Patient, "self@example.org", "Self Service");
        let p = fx.patient("Self", "Service");

        assert!(matches!(
            set_triage(&mut fx.conn, &patient_user, &p.id, TriageLevel::Urgent),
            Err(CoreError::Forbidden(_))
        ));
        assert!(matches!(
            list_patients(&fx.conn, &patient_user, Page::default()),
            Err(CoreError::Forbidden(_))
        ));
    }

    #[test]
    fn test_registration_records_registering_actor() {
        let mut fx = Fixture::new();
        let nurse = fx.nurse();
        let patient =
            register_patient(&mut fx.conn, Some(&nurse), new_patient("Florence", "N")).unwrap();
        assert_eq!(patient.registered_by, Some(nurse.user_id.clone()));
        assert_eq!(patient.display_name(), "Florence N");

        let anonymous = fx.patient("Walk", "In");
        assert_eq!(anonymous.registered_by, None);
    }

    #[test]
    fn test_duplicate_user_id_is_rejected() {
        let mut fx = Fixture::new();
        let account = fx.actor(Role::Patient, "linked@example.org", "Linked Patient");

        let mut new = new_patient("Linked", "Patient");
        new.user_id = Some(account.user_id.clone());
        register_patient(&mut fx.conn, None, new.clone()).unwrap();

        assert!(matches!(
            register_patient(&mut fx.conn, None, new),
            Err(CoreError::DuplicateKey(_))
        ));
    }

    #[test]
    fn test_unknown_user_id_is_not_found() {
        let mut fx = Fixture::new();
        let mut new = new_patient("Ghost", "Account");
        new.user_id = Some(ShardableUuid::new());
        assert!(matches!(
            register_patient(&mut fx.conn, None, new),
            Err(CoreError::NotFound { entity: "user", .. })
        ));
    }

    #[test]
    fn test_list_patients_paginates_in_registration_order() {
        let mut fx = Fixture::new();
        let doctor = fx.doctor();
        let ids: Vec<_> = (0..5)
            .map(|i| fx.patient(&format!("P{i}"), "Test").id)
            .collect();

        let page = list_patients(&fx.conn, &doctor, Page::new(Some(1), Some(2))).unwrap();
        let got: Vec<_> = page.into_iter().map(|p| p.id).collect();
        assert_eq!(got, ids[1..3].to_vec());
    }
}
