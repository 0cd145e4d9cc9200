//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Request handlers never read process-wide environment variables;
//! they receive a shared `Arc<CoreConfig>` instead.

use crate::constants::{
    DEFAULT_TOKEN_TTL_MINUTES, MAX_TOKEN_TTL_MINUTES, MIN_PBKDF2_ITERATIONS, PBKDF2_ITERATIONS,
};
use crate::{CoreError, CoreResult};
use chrono::Duration;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    database_path: PathBuf,
    upload_dir: PathBuf,
    token_ttl: Duration,
    password_iterations: u32,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` if either path is empty or the token lifetime is not
    /// in `1..=MAX_TOKEN_TTL_MINUTES`.
    pub fn new(
        database_path: PathBuf,
        upload_dir: PathBuf,
        token_ttl_minutes: i64,
    ) -> CoreResult<Self> {
        if database_path.as_os_str().is_empty() {
            return Err(CoreError::InvalidInput(
                "database_path cannot be empty".into(),
            ));
        }
        if upload_dir.as_os_str().is_empty() {
            return Err(CoreError::InvalidInput("upload_dir cannot be empty".into()));
        }
        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&token_ttl_minutes) {
            return Err(CoreError::InvalidInput(format!(
                "token lifetime must be between 1 and {MAX_TOKEN_TTL_MINUTES} minutes, got {token_ttl_minutes}"
            )));
        }

        Ok(Self {
            database_path,
            upload_dir,
            token_ttl: Duration::minutes(token_ttl_minutes),
            password_iterations: PBKDF2_ITERATIONS,
        })
    }

    /// Overrides the PBKDF2 work factor used for newly stored passwords.
    ///
    /// Existing digests keep verifying because each one records its own iteration count.
    pub fn with_password_iterations(mut self, iterations: u32) -> CoreResult<Self> {
        if iterations < MIN_PBKDF2_ITERATIONS {
            return Err(CoreError::InvalidInput(format!(
                "password iterations must be at least {MIN_PBKDF2_ITERATIONS}"
            )));
        }
        self.password_iterations = iterations;
        Ok(self)
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    pub fn password_iterations(&self) -> u32 {
        self.password_iterations
    }

    /// Create the upload root if it is missing.
    ///
    /// Intended to be called once at startup, before any document is stored.
    pub fn prepare_upload_dir(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.upload_dir).map_err(|e| {
            CoreError::InvalidInput(format!(
                "cannot create upload directory {}: {}",
                self.upload_dir.display(),
                e
            ))
        })
    }
}

/// Parse the token lifetime from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default lifetime.
pub fn token_ttl_from_env_value(value: Option<String>) -> CoreResult<i64> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value
        .map(|v| {
            v.parse::<i64>().map_err(|_| {
                CoreError::InvalidInput(format!("TOKEN_TTL_MINUTES is not a number: '{v}'"))
            })
        })
        .transpose()?;

    Ok(parsed.unwrap_or(DEFAULT_TOKEN_TTL_MINUTES))
}
