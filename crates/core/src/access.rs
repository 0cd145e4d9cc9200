//! Authorization gate.
//!
//! A bearer token resolves to an [`Actor`]; operations then check the actor against a
//! [`Capability`]. Two capabilities exist: doctor-only actions (prescribing, admitting) and
//! staff actions (everything else that reads or changes clinical state).
//!
//! Anonymous callers are limited to self-service intake: registering a patient, requesting an
//! appointment, listing doctors, signing up and logging in.

use crate::auth::verify_token;
use crate::model::{Role, User};
use crate::{CoreError, CoreResult};
use multicare_types::{EmailAddress, NonEmptyText};
use multicare_uuid::ShardableUuid;
use rusqlite::Connection;

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub user_id: ShardableUuid,
    pub email: EmailAddress,
    pub full_name: NonEmptyText,
    pub role: Role,
}

impl From<User> for Actor {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// `{doctor}`
    DoctorOnly,
    /// `{doctor, nurse}`
    Staff,
}

impl Capability {
    pub fn roles(&self) -> &'static [Role] {
        match self {
            Capability::DoctorOnly => &[Role::Doctor],
            Capability::Staff => &[Role::Doctor, Role::Nurse],
        }
    }

    fn denial(&self) -> &'static str {
        match self {
            Capability::DoctorOnly => "Only doctors can perform this action",
            Capability::Staff => "Only doctors and nurses can perform this action",
        }
    }
}

/// Resolves an optional bearer token. A missing token fails with `Unauthenticated`.
pub fn authenticate(conn: &Connection, token: Option<&str>) -> CoreResult<Actor> {
    let token = token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| CoreError::Unauthenticated("Not authenticated".into()))?;
    Ok(verify_token(conn, token)?.into())
}

pub fn authorize(actor: &Actor, capability: Capability) -> CoreResult<()> {
    if capability.roles().contains(&actor.role) {
        Ok(())
    } else {
        tracing::warn!(user_id = %actor.user_id, role = %actor.role, ?capability, "access denied");
        Err(CoreError::Forbidden(capability.denial().into()))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn actor(role: Role) -> Actor {
        Actor {
            user_id: ShardableUuid::new(),
            email: EmailAddress::parse(format!("{}@example.org", role)).unwrap(),
            full_name: NonEmptyText::new("Test Actor").unwrap(),
            role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::actor;
    use super::*;

    #[test]
    fn test_doctor_only_admits_only_doctors() {
        assert!(authorize(&actor(Role::Doctor), Capability::DoctorOnly).is_ok());
        assert!(matches!(
            authorize(&actor(Role::Nurse), Capability::DoctorOnly),
            Err(CoreError::Forbidden(_))
        ));
        assert!(authorize(&actor(Role::Patient), Capability::DoctorOnly).is_err());
    }

    #[test]
    fn test_staff_admits_doctors_and_nurses() {
        assert!(authorize(&actor(Role::Doctor), Capability::Staff).is_ok());
        assert!(authorize(&actor(Role::Nurse), Capability::Staff).is_ok());
        assert!(matches!(
            authorize(&actor(Role::Patient), Capability::Staff),
            Err(CoreError::Forbidden(_))
        ));
    }

    #[test]
    fn test_authenticate_requires_a_token() {
        let (_temp, store) = crate::db::test_support::temp_store();
        let conn = store.connection().unwrap();
        assert!(matches!(
            authenticate(&conn, None),
            Err(CoreError::Unauthenticated(_))
        ));
        assert!(matches!(
            authenticate(&conn, Some("   ")),
            Err(CoreError::Unauthenticated(_))
        ));
        assert!(matches!(
            authenticate(&conn, Some("bogus")),
            Err(CoreError::Unauthenticated(_))
        ));
    }
}
