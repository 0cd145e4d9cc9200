//! Credential service: password digests, account signup, and bearer tokens.
//!
//! Passwords are stored as `pbkdf2-sha256$<iterations>$<salt>$<hash>` with base64 (no padding)
//! salt and hash. Tokens are 32 random bytes, URL-safe base64 encoded; only their SHA-256 hex
//! digest is kept server-side, alongside an expiry.

use crate::config::CoreConfig;
use crate::constants::{
    MIN_PASSWORD_LENGTH, PASSWORD_HASH_LENGTH, PASSWORD_SALT_LENGTH, PASSWORD_SCHEME,
};
use crate::db::{begin_write, now};
use crate::model::{Role, Staff, User};
use crate::repositories::{sessions, staff, users};
use crate::{CoreError, CoreResult};
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Utc};
use multicare_types::{EmailAddress, NonEmptyText};
use multicare_uuid::{Sha256Hash, ShardableUuid};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use rusqlite::Connection;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Message shared by every login failure so callers cannot probe which emails exist.
const BAD_CREDENTIALS: &str = "Incorrect email or password";

/// Derives a storable digest for `password`.
pub fn hash_password(password: &str, iterations: u32) -> CoreResult<String> {
    if iterations == 0 {
        return Err(CoreError::Credential("iterations must be positive".into()));
    }
    let mut salt = [0u8; PASSWORD_SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut hash = [0u8; PASSWORD_HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut hash);

    Ok(format!(
        "{PASSWORD_SCHEME}${iterations}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash)
    ))
}

/// Checks `password` against a digest produced by [`hash_password`].
///
/// Malformed digests never verify.
pub fn verify_password(password: &str, digest: &str) -> bool {
    let mut parts = digest.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    if scheme != PASSWORD_SCHEME {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    if iterations == 0 {
        return false;
    }
    let (Ok(salt), Ok(expected)) = (STANDARD_NO_PAD.decode(salt), STANDARD_NO_PAD.decode(expected))
    else {
        return false;
    };
    if expected.is_empty() {
        return false;
    }

    let mut actual = vec![0u8; expected.len()];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut actual);
    actual.ct_eq(&expected).into()
}

/// Random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 hex digest under which a token is stored.
pub fn hash_token(token: &str) -> String {
    let digest: [u8; 32] = Sha256::digest(token.as_bytes()).into();
    Sha256Hash::from_bytes(&digest).to_string()
}

/// Account details supplied at signup.
#[derive(Debug, Clone)]
pub struct Signup {
    pub email: EmailAddress,
    pub password: String,
    pub full_name: NonEmptyText,
    pub role: Role,
    pub specialization: Option<NonEmptyText>,
}

/// A freshly issued bearer token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// Splits "Ada Lovelace" into ("Ada", "Lovelace"); everything before the last word is the
/// first name.
fn split_full_name(full_name: &NonEmptyText) -> CoreResult<(NonEmptyText, NonEmptyText)> {
    match full_name.as_str().rsplit_once(char::is_whitespace) {
        Some((first, last)) => Ok((NonEmptyText::new(first)?, NonEmptyText::new(last)?)),
        None => Err(CoreError::InvalidInput(
            "full_name must include a first and last name for staff accounts".into(),
        )),
    }
}

/// Creates a user account.
///
/// Doctor and nurse accounts also get a staff directory entry with the same id, written in the
/// same transaction.
///
/// # Errors
///
/// - `InvalidInput` for a short password or a single-word staff name.
/// - `DuplicateKey` if the email is already registered.
pub fn signup(conn: &mut Connection, cfg: &CoreConfig, signup: Signup) -> CoreResult<User> {
    if signup.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CoreError::InvalidInput(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    let staff_names = if signup.role.is_staff() {
        Some(split_full_name(&signup.full_name)?)
    } else {
        None
    };

    let user = User {
        id: ShardableUuid::new(),
        email: signup.email,
        full_name: signup.full_name,
        password_hash: hash_password(&signup.password, cfg.password_iterations())?,
        role: signup.role,
        created_at: now(),
    };

    let tx = begin_write(conn)?;
    users::insert(&tx, &user)?;
    if let Some((first_name, last_name)) = staff_names {
        staff::insert(
            &tx,
            &Staff {
                id: user.id.clone(),
                first_name,
                last_name,
                role: user.role,
                specialization: signup.specialization,
                created_at: user.created_at,
            },
        )?;
    }
    tx.commit()?;

    tracing::info!(user_id = %user.id, role = %user.role, "account created");
    Ok(user)
}

/// Issues a token for an existing user.
pub fn issue_token(conn: &Connection, cfg: &CoreConfig, user: User) -> CoreResult<IssuedToken> {
    let access_token = generate_token();
    let issued_at = now();
    let expires_at = issued_at + cfg.token_ttl();
    sessions::insert(conn, &hash_token(&access_token), &user.id, &issued_at, &expires_at)?;
    Ok(IssuedToken {
        access_token,
        expires_at,
        user,
    })
}

/// Exchanges an email and password for a bearer token.
///
/// Unknown emails and wrong passwords fail identically with `Unauthenticated`.
pub fn login(
    conn: &Connection,
    cfg: &CoreConfig,
    email: &str,
    password: &str,
) -> CoreResult<IssuedToken> {
    let email =
        EmailAddress::parse(email).map_err(|_| CoreError::Unauthenticated(BAD_CREDENTIALS.into()))?;
    let user = users::find_by_email(conn, &email)?
        .ok_or_else(|| CoreError::Unauthenticated(BAD_CREDENTIALS.into()))?;

    if !verify_password(password, &user.password_hash) {
        tracing::warn!(user_id = %user.id, "login rejected");
        return Err(CoreError::Unauthenticated(BAD_CREDENTIALS.into()));
    }

    sessions::purge_expired(conn, &Utc::now())?;
    issue_token(conn, cfg, user)
}

/// Resolves a bearer token to its user. Unknown and expired tokens fail with `Unauthenticated`.
pub fn verify_token(conn: &Connection, token: &str) -> CoreResult<User> {
    sessions::find_active_user(conn, &hash_token(token), &Utc::now())?
        .ok_or_else(|| CoreError::Unauthenticated("Could not validate credentials".into()))
}

/// Invalidates a token. Returns false if it was not active.
pub fn revoke_token(conn: &Connection, token: &str) -> CoreResult<bool> {
    sessions::delete(conn, &hash_token(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::temp_store;
    use crate::constants::MIN_PBKDF2_ITERATIONS;

    fn test_config() -> CoreConfig {
        CoreConfig::new("unused.db".into(), "unused".into(), 30)
            .unwrap()
            .with_password_iterations(MIN_PBKDF2_ITERATIONS)
            .unwrap()
    }

    fn signup_request(email: &str, role: Role) -> Signup {
        Signup {
            email: EmailAddress::parse(email).unwrap(),
            password: "correct horse".into(),
            full_name: NonEmptyText::new("Grace Hopper").unwrap(),
            role,
            specialization: None,
        }
    }

    #[test]
    fn test_password_round_trip() {
        let digest = hash_password("s3cret-pass", MIN_PBKDF2_ITERATIONS).unwrap();
        assert!(digest.starts_with("pbkdf2-sha256$1000$"));
        assert!(verify_password("s3cret-pass", &digest));
        assert!(!verify_password("s3cret-pasS", &digest));
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let a = hash_password("same", MIN_PBKDF2_ITERATIONS).unwrap();
        let b = hash_password("same", MIN_PBKDF2_ITERATIONS).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_digest_never_verifies() {
        for digest in [
            "",
            "plaintext",
            "pbkdf2-sha256$abc$c2FsdA$aGFzaA",
            "pbkdf2-sha256$0$c2FsdA$aGFzaA",
            "bcrypt$1000$c2FsdA$aGFzaA",
            "pbkdf2-sha256$1000$c2FsdA$",
            "pbkdf2-sha256$1000$c2FsdA$aGFzaA$extra",
        ] {
            assert!(!verify_password("anything", digest), "{digest}");
        }
    }

    #[test]
    fn test_token_hash_is_hex_and_deterministic() {
        let token = generate_token();
        assert_eq!(hash_token(&token), hash_token(&token));
        assert_eq!(hash_token(&token).len(), 64);
        assert_ne!(generate_token(), token);
    }

    #[test]
    fn test_staff_signup_creates_directory_entry() {
        let (_temp, store) = temp_store();
        let mut conn = store.connection().unwrap();
        let user = signup(&mut conn, &test_config(), signup_request("dr@example.org", Role::Doctor))
            .unwrap();

        let entry = staff::get(&conn, &user.id).unwrap();
        assert_eq!(entry.role, Role::Doctor);
        assert_eq!(entry.display_name(), "Grace Hopper");
    }

    #[test]
    fn test_patient_signup_has_no_directory_entry() {
        let (_temp, store) = temp_store();
        let mut conn = store.connection().unwrap();
        let user = signup(&mut conn, &test_config(), signup_request("p@example.org", Role::Patient))
            .unwrap();
        assert!(matches!(
            staff::get(&conn, &user.id),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_signup_rejects_duplicate_email_case_insensitively() {
        let (_temp, store) = temp_store();
        let mut conn = store.connection().unwrap();
        let cfg = test_config();
        signup(&mut conn, &cfg, signup_request("nurse@example.org", Role::Nurse)).unwrap();

        let result = signup(&mut conn, &cfg, signup_request("Nurse@Example.org", Role::Nurse));
        match result {
            Err(CoreError::DuplicateKey(msg)) => assert_eq!(msg, "Email already registered"),
            other => panic!("expected DuplicateKey, got {other:?}"),
        }
    }

    #[test]
    fn test_single_word_staff_name_is_rejected_without_side_effects() {
        let (_temp, store) = temp_store();
        let mut conn = store.connection().unwrap();
        let mut req = signup_request("solo@example.org", Role::Nurse);
        req.full_name = NonEmptyText::new("Cher").unwrap();

        assert!(matches!(
            signup(&mut conn, &test_config(), req),
            Err(CoreError::InvalidInput(_))
        ));
        let email = EmailAddress::parse("solo@example.org").unwrap();
        assert!(users::find_by_email(&conn, &email).unwrap().is_none());
    }

    #[test]
    fn test_short_password_is_rejected() {
        let (_temp, store) = temp_store();
        let mut conn = store.connection().unwrap();
        let mut req = signup_request("short@example.org", Role::Patient);
        req.password = "short".into();
        assert!(matches!(
            signup(&mut conn, &test_config(), req),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_login_and_verify_token() {
        let (_temp, store) = temp_store();
        let mut conn = store.connection().unwrap();
        let cfg = test_config();
        let user = signup(&mut conn, &cfg, signup_request("dr@example.org", Role::Doctor)).unwrap();

        let issued = login(&conn, &cfg, "DR@example.org", "correct horse").unwrap();
        assert_eq!(issued.user.id, user.id);

        let resolved = verify_token(&conn, &issued.access_token).unwrap();
        assert_eq!(resolved.id, user.id);
        assert_eq!(resolved.role, Role::Doctor);
    }

    #[test]
    fn test_login_failures_are_indistinguishable() {
        let (_temp, store) = temp_store();
        let mut conn = store.connection().unwrap();
        let cfg = test_config();
        signup(&mut conn, &cfg, signup_request("dr@example.org", Role::Doctor)).unwrap();

        let wrong_password = login(&conn, &cfg, "dr@example.org", "wrong password").unwrap_err();
        let unknown_email = login(&conn, &cfg, "nobody@example.org", "correct horse").unwrap_err();
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert!(matches!(wrong_password, CoreError::Unauthenticated(_)));
    }

    #[test]
    fn test_unknown_expired_and_revoked_tokens_fail() {
        let (_temp, store) = temp_store();
        let mut conn = store.connection().unwrap();
        let cfg = test_config();
        let user = signup(&mut conn, &cfg, signup_request("dr@example.org", Role::Doctor)).unwrap();

        assert!(matches!(
            verify_token(&conn, "not-a-token"),
            Err(CoreError::Unauthenticated(_))
        ));

        let expired = generate_token();
        let issued_at = Utc::now() - chrono::Duration::minutes(60);
        sessions::insert(
            &conn,
            &hash_token(&expired),
            &user.id,
            &issued_at,
            &(issued_at + chrono::Duration::minutes(30)),
        )
        .unwrap();
        assert!(matches!(
            verify_token(&conn, &expired),
            Err(CoreError::Unauthenticated(_))
        ));

        let issued = issue_token(&conn, &cfg, user).unwrap();
        assert!(revoke_token(&conn, &issued.access_token).unwrap());
        assert!(verify_token(&conn, &issued.access_token).is_err());
    }
}
