//! Bearer credential parsing, usable by any HTTP front end.

/// Why an `Authorization` header could not be used.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthHeaderError {
    #[error("Authorization header must use the Bearer scheme")]
    WrongScheme,
    #[error("Bearer token is empty")]
    EmptyToken,
}

/// Extracts the token from an `Authorization` header value.
///
/// `None` means no header was sent. The scheme name is matched case-insensitively.
pub fn bearer_token(header: Option<&str>) -> Result<Option<&str>, AuthHeaderError> {
    let Some(header) = header else {
        return Ok(None);
    };
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or(AuthHeaderError::WrongScheme)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthHeaderError::WrongScheme);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthHeaderError::EmptyToken);
    }
    Ok(Some(token))
}
