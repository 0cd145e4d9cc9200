//! Staff directory.

use crate::access::{authorize, Actor, Capability};
use crate::db::{begin_write, now};
use crate::model::{NewStaff, Page, Role, Staff};
use crate::repositories::staff;
use crate::{CoreError, CoreResult};
use multicare_uuid::ShardableUuid;
use rusqlite::Connection;

/// Adds a directory entry that has no login account.
pub fn add_staff(conn: &mut Connection, actor: &Actor, new: NewStaff) -> CoreResult<Staff> {
    authorize(actor, Capability::Staff)?;
    if !new.role.is_staff() {
        return Err(CoreError::InvalidInput(
            "staff role must be doctor or nurse".into(),
        ));
    }
    let entry = Staff {
        id: ShardableUuid::new(),
        first_name: new.first_name,
        last_name: new.last_name,
        role: new.role,
        specialization: new.specialization,
        created_at: now(),
    };
    let tx = begin_write(conn)?;
    staff::insert(&tx, &entry)?;
    tx.commit()?;
    Ok(entry)
}

pub fn list_staff(
    conn: &Connection,
    actor: &Actor,
    role: Option<Role>,
    page: Page,
) -> CoreResult<Vec<Staff>> {
    authorize(actor, Capability::Staff)?;
    staff::list(conn, role, page)
}

/// Doctors for the public appointment form.
pub fn list_doctors(conn: &Connection) -> CoreResult<Vec<Staff>> {
    staff::list(conn, Some(Role::Doctor), Page::new(None, Some(u32::MAX)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::test_support::Fixture;
    use multicare_types::NonEmptyText;

    fn new_staff(first: &str, last: &str, role: Role) -> NewStaff {
        NewStaff {
            first_name: NonEmptyText::new(first).unwrap(),
            last_name: NonEmptyText::new(last).unwrap(),
            role,
            specialization: NonEmptyText::optional(Some("Cardiology")),
        }
    }

    #[test]
    fn test_list_doctors_excludes_nurses() {
        let mut fx = Fixture::new();
        let nurse = fx.nurse();
        let doctor = fx.doctor();
        add_staff(&mut fx.conn, &nurse, new_staff("Lisa", "Cuddy", Role::Doctor)).unwrap();

        let doctors = list_doctors(&fx.conn).unwrap();
        assert_eq!(doctors.len(), 2);
        assert!(doctors.iter().all(|d| d.role == Role::Doctor));
        assert!(doctors.iter().any(|d| d.id == doctor.user_id));

        let everyone = list_staff(&fx.conn, &nurse, None, Page::default()).unwrap();
        assert_eq!(everyone.len(), 3);
        let nurses = list_staff(&fx.conn, &nurse, Some(Role::Nurse), Page::default()).unwrap();
        assert_eq!(nurses.len(), 1);
    }

    #[test]
    fn test_patient_role_is_not_staff() {
        let mut fx = Fixture::new();
        let nurse = fx.nurse();
        assert!(matches!(
            add_staff(&mut fx.conn, &nurse, new_staff("Not", "Staff", Role::Patient)),
            Err(CoreError::InvalidInput(_))
        ));
    }
}
