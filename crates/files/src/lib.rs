//! Multicare document storage
//!
//! Uploaded patient documents (scans, referral letters, lab PDFs) are kept out of the
//! relational store. The database holds a metadata row per document; the bytes live on disk
//! in a per-patient, content-addressed area:
//!
//! ```text
//! <upload_root>/
//! └── <s1>/<s2>/<patient_id>/
//!     └── files/
//!         └── sha256/
//!             └── ab/
//!                 └── 3f/
//!                     └── ab3f9e…
//! ```
//!
//! - Blobs are immutable once written; identical content is stored once per patient.
//! - Paths are derived only from the patient id and the content hash, never from
//!   client-supplied filenames.
//!
//! ## Example Usage
//!
//! ```no_run
//! use multicare_files::FilesService;
//! use multicare_uuid::ShardableUuid;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let patient_id = ShardableUuid::parse("550e8400e29b41d4a716446655440000")?;
//! let service = FilesService::new(Path::new("uploads"), patient_id)?;
//! let metadata = service.add_bytes("referral.pdf", b"%PDF-1.7 ...")?;
//! let bytes = service.read(metadata.hash.as_str())?;
//! # Ok(())
//! # }
//! ```

mod constants;
mod files;

pub use constants::{FILES_FOLDER_NAME, HASH_ALGORITHM};
pub use files::{FileMetadata, FilesService};
pub use multicare_uuid::ShardableUuid;

/// Errors that can occur during file operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Root directory does not exist or is not a directory
    #[error("Invalid root directory: {0}")]
    InvalidRootDirectory(String),

    /// Path validation failed
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// No blob is stored under the requested hash
    #[error("File not found for hash: {0}")]
    NotFound(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Identifier or digest validation failed
    #[error("UUID error: {0}")]
    Uuid(#[from] multicare_uuid::UuidError),
}
