//! Appointment scheduling.

use crate::access::{authorize, Actor, Capability};
use crate::db::{begin_write, now};
use crate::model::{Appointment, AppointmentStatus, NewAppointment, Page};
use crate::repositories::{appointments, patients, staff};
use crate::{CoreError, CoreResult};
use multicare_uuid::ShardableUuid;
use rusqlite::Connection;

/// Books an appointment with status `pending`. Open to anonymous callers.
///
/// Overlapping appointments for the same doctor or patient are accepted.
///
/// # Errors
///
/// `NotFound` naming the patient or the doctor, whichever is missing. A staff member who is
/// not a doctor counts as a missing doctor.
pub fn schedule(
    conn: &mut Connection,
    actor: Option<&Actor>,
    new: NewAppointment,
) -> CoreResult<Appointment> {
    let tx = begin_write(conn)?;
    patients::get(&tx, &new.patient_id)?;
    if let Some(doctor_id) = &new.doctor_id {
        staff::get_doctor(&tx, doctor_id)?;
    }

    let appointment = Appointment {
        id: ShardableUuid::new(),
        patient_id: new.patient_id,
        doctor_id: new.doctor_id,
        appointment_time: new.appointment_time,
        reason: new.reason,
        status: AppointmentStatus::Pending,
        created_at: now(),
    };
    appointments::insert(&tx, &appointment)?;
    tx.commit()?;

    tracing::info!(
        appointment_id = %appointment.id,
        booked_by = ?actor.map(|a| a.user_id.to_string()),
        "appointment requested"
    );
    Ok(appointment)
}

pub fn list_appointments(conn: &Connection, actor: &Actor, page: Page) -> CoreResult<Vec<Appointment>> {
    authorize(actor, Capability::Staff)?;
    appointments::list(conn, page)
}

/// Changes an appointment's status.
///
/// Re-applying the current status is a no-op. `cancelled` and `completed` are final; any
/// change away from them fails with `Conflict`.
pub fn update_appointment_status(
    conn: &mut Connection,
    actor: &Actor,
    appointment_id: &ShardableUuid,
    status: AppointmentStatus,
) -> CoreResult<Appointment> {
    authorize(actor, Capability::Staff)?;

    let tx = begin_write(conn)?;
    let current = appointments::get(&tx, appointment_id)?;
    if current.status == status {
        return Ok(current);
    }
    if current.status.is_terminal() {
        return Err(CoreError::Conflict(format!(
            "appointment {appointment_id} is already {}",
            current.status
        )));
    }
    appointments::set_status(&tx, appointment_id, status)?;
    let updated = appointments::get(&tx, appointment_id)?;
    tx.commit()?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::test_support::Fixture;
    use chrono::NaiveDate;
    use multicare_types::NonEmptyText;

    fn at(hour: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn booking(patient: &ShardableUuid, doctor: Option<&ShardableUuid>) -> NewAppointment {
        NewAppointment {
            patient_id: patient.clone(),
            doctor_id: doctor.cloned(),
            appointment_time: at(9),
            reason: NonEmptyText::optional(Some("follow-up")),
        }
    }

    #[test]
    fn test_schedule_starts_pending() {
        let mut fx = Fixture::new();
        let doctor = fx.doctor();
        let patient = fx.patient("Out", "Patient");

        let appt = schedule(&mut fx.conn, None, booking(&patient.id, Some(&doctor.user_id))).unwrap();
        assert_eq!(appt.status, AppointmentStatus::Pending);
        assert_eq!(appt.doctor_id, Some(doctor.user_id));
        assert_eq!(appt.appointment_time, at(9));
    }

    #[test]
    fn test_unknown_doctor_or_patient_creates_nothing() {
        let mut fx = Fixture::new();
        let doctor = fx.doctor();
        let nurse = fx.nurse();
        let patient = fx.patient("Out", "Patient");

        let unknown_doctor = ShardableUuid::new();
        assert!(matches!(
            schedule(&mut fx.conn, None, booking(&patient.id, Some(&unknown_doctor))),
            Err(CoreError::NotFound { entity: "doctor", .. })
        ));
        assert!(matches!(
            schedule(&mut fx.conn, None, booking(&patient.id, Some(&nurse.user_id))),
            Err(CoreError::NotFound { entity: "doctor", .. })
        ));
        assert!(matches!(
            schedule(&mut fx.conn, None, booking(&ShardableUuid::new(), Some(&doctor.user_id))),
            Err(CoreError::NotFound { entity: "patient", .. })
        ));
        assert_eq!(appointments::count(&fx.conn).unwrap(), 0);
    }

    #[test]
    fn test_double_booking_is_accepted() {
        let mut fx = Fixture::new();
        let doctor = fx.doctor();
        let a = fx.patient("First", "Booking");
        let b = fx.patient("Second", "Booking");

        schedule(&mut fx.conn, None, booking(&a.id, Some(&doctor.user_id))).unwrap();
        schedule(&mut fx.conn, None, booking(&b.id, Some(&doctor.user_id))).unwrap();
        schedule(&mut fx.conn, None, booking(&a.id, Some(&doctor.user_id))).unwrap();
        assert_eq!(appointments::count(&fx.conn).unwrap(), 3);
    }

    #[test]
    fn test_status_transitions() {
        let mut fx = Fixture::new();
        let nurse = fx.nurse();
        let patient = fx.patient("Status", "Check");
        let appt = schedule(&mut fx.conn, None, booking(&patient.id, None)).unwrap();

        let confirmed =
            update_appointment_status(&mut fx.conn, &nurse, &appt.id, AppointmentStatus::Confirmed)
                .unwrap();
        assert_eq!(confirmed.status, AppointmentStatus::Confirmed);

        let again =
            update_appointment_status(&mut fx.conn, &nurse, &appt.id, AppointmentStatus::Confirmed)
                .unwrap();
        assert_eq!(again.status, AppointmentStatus::Confirmed);

        update_appointment_status(&mut fx.conn, &nurse, &appt.id, AppointmentStatus::Completed)
            .unwrap();
        assert!(matches!(
            update_appointment_status(&mut fx.conn, &nurse, &appt.id, AppointmentStatus::Pending),
            Err(CoreError::Conflict(_))
        ));
        assert!(update_appointment_status(
            &mut fx.conn,
            &nurse,
            &appt.id,
            AppointmentStatus::Completed
        )
        .is_ok());
    }

    #[test]
    fn test_status_update_needs_staff() {
        let mut fx = Fixture::new();
        let patient_user =
            fx.actor(crate::model::Role::Patient, "p@example.org", "Pat Ient");
        assert!(matches!(
            update_appointment_status(
                &mut fx.conn,
                &patient_user,
                &ShardableUuid::new(),
                AppointmentStatus::Cancelled
            ),
            Err(CoreError::Forbidden(_))
        ));
    }
}
