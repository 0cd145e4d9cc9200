use multicare_files::FilesError;
use rusqlite::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("not authenticated: {0}")]
    Unauthenticated(String),
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("database error: {0}")]
    Database(rusqlite::Error),
    #[error("migration {version} failed: {reason}")]
    Migration { version: i64, reason: String },
    #[error("document storage error: {0}")]
    Storage(FilesError),
    #[error("failed to hash credential: {0}")]
    Credential(String),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, message)
                if code.code == ErrorCode::ConstraintViolation
                    && (code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                        || code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY) =>
            {
                CoreError::DuplicateKey(
                    message
                        .clone()
                        .unwrap_or_else(|| "unique constraint violated".into()),
                )
            }
            _ => CoreError::Database(err),
        }
    }
}

impl From<FilesError> for CoreError {
    fn from(err: FilesError) -> Self {
        match err {
            FilesError::InvalidPath(reason) => CoreError::InvalidInput(reason),
            FilesError::NotFound(hash) => CoreError::not_found("document content", hash),
            other => CoreError::Storage(other),
        }
    }
}

impl From<multicare_types::TextError> for CoreError {
    fn from(err: multicare_types::TextError) -> Self {
        CoreError::InvalidInput(err.to_string())
    }
}

impl From<multicare_uuid::UuidError> for CoreError {
    fn from(err: multicare_uuid::UuidError) -> Self {
        CoreError::InvalidInput(err.to_string())
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
