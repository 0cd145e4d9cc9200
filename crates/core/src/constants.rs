//! Constants used throughout the Multicare core crate.

/// Default SQLite database file, relative to the working directory.
pub const DEFAULT_DATABASE_PATH: &str = "multicare.db";

/// Default root directory for uploaded document blobs.
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

/// Default lifetime of an issued bearer token.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;

/// Upper bound accepted for `TOKEN_TTL_MINUTES` (one week).
pub const MAX_TOKEN_TTL_MINUTES: i64 = 7 * 24 * 60;

/// How long a connection waits on a locked database before giving up.
pub const BUSY_TIMEOUT_MS: u64 = 5_000;

/// Page defaults for list endpoints.
pub const DEFAULT_PAGE_LIMIT: u32 = 100;
pub const MAX_PAGE_LIMIT: u32 = 1_000;

/// PBKDF2-HMAC-SHA256 work factor for stored password digests.
pub const PBKDF2_ITERATIONS: u32 = 210_000;
/// Lowest work factor `CoreConfig` accepts; test fixtures use it to keep hashing fast.
pub const MIN_PBKDF2_ITERATIONS: u32 = 1_000;
pub const PASSWORD_SALT_LENGTH: usize = 16;
pub const PASSWORD_HASH_LENGTH: usize = 32;
pub const PASSWORD_SCHEME: &str = "pbkdf2-sha256";

/// Shortest password accepted at signup.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Prefix for the room number written by a transfer.
pub const TRANSFER_ROOM_PREFIX: &str = "Dept-";
