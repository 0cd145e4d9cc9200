//! Patient-scoped blob storage.
//!
//! [`FilesService`] is bound to one upload root and one patient. It only ever writes below
//! `<root>/<s1>/<s2>/<patient_id>/files/`, and the final path segment is always a SHA-256
//! digest, so client input can never steer a write outside that area.
//!
//! Writes are content-addressed: adding bytes whose digest is already present returns the
//! existing metadata instead of rewriting the file.

use crate::{FilesError, FILES_FOLDER_NAME, HASH_ALGORITHM};
use chrono::{DateTime, Utc};
use multicare_types::NonEmptyText;
use multicare_uuid::{Sha256Hash, ShardableUuid};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Metadata for a stored file.
///
/// The document repository persists these fields alongside the patient reference.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct FileMetadata {
    /// Hashing algorithm used (always "sha256")
    pub hash_algorithm: NonEmptyText,

    /// Hexadecimal digest of the file content
    pub hash: Sha256Hash,

    /// Path relative to the upload root where the file is stored
    pub relative_path: NonEmptyText,

    /// Size of the file in bytes
    pub size_bytes: u64,

    /// Detected media type (MIME type), if available
    ///
    /// Best-effort sniffing of the leading bytes; not authoritative.
    pub media_type: Option<NonEmptyText>,

    /// Filename supplied by the uploader, reduced to its final path component
    pub original_filename: NonEmptyText,

    /// UTC timestamp when the file was stored
    pub stored_at: DateTime<Utc>,
}

/// Service for storing and reading one patient's document blobs.
#[derive(Debug)]
pub struct FilesService {
    /// Canonicalised upload root shared by all patients
    root_directory: PathBuf,

    /// Patient the blobs belong to
    patient_id: ShardableUuid,
}

impl FilesService {
    /// Creates a new `FilesService` for a specific patient.
    ///
    /// The patient's directory does not need to exist yet; it is created on first write.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidRootDirectory` if the root directory does not exist, is not
    /// a directory, or cannot be canonicalised.
    pub fn new(root_directory: &Path, patient_id: ShardableUuid) -> Result<Self, FilesError> {
        if !root_directory.is_dir() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Directory does not exist: {}",
                root_directory.display()
            )));
        }

        let root_directory = root_directory.canonicalize().map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot canonicalize path {}: {}",
                root_directory.display(),
                e
            ))
        })?;

        Ok(Self {
            root_directory,
            patient_id,
        })
    }

    /// Stores `content` and returns its metadata.
    ///
    /// # Arguments
    ///
    /// * `filename` - Name supplied by the uploader. Only the final path component is kept and
    ///   it is recorded as metadata, never used to build the storage path.
    /// * `content` - Raw file bytes
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if the filename is blank, or directory creation or the write
    /// fails.
    pub fn add_bytes(&self, filename: &str, content: &[u8]) -> Result<FileMetadata, FilesError> {
        let original_filename = sanitise_filename(filename)?;

        let digest: [u8; 32] = Sha256::digest(content).into();
        let hash = Sha256Hash::from_bytes(&digest);

        let relative_path = self.compute_relative_path(hash.as_str())?;
        let storage_path = self.root_directory.join(relative_path.as_str());

        if !storage_path.exists() {
            if let Some(parent) = storage_path.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    FilesError::Io(std::io::Error::new(
                        e.kind(),
                        format!(
                            "Failed to create storage directory {}: {}",
                            parent.display(),
                            e
                        ),
                    ))
                })?;
            }

            // Write to a sibling temp file first so a crash never leaves a truncated blob
            // under its final content address.
            let tmp_path = storage_path.with_extension("partial");
            fs::write(&tmp_path, content).map_err(|e| {
                FilesError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to write file to {}: {}", tmp_path.display(), e),
                ))
            })?;
            fs::rename(&tmp_path, &storage_path)?;
        }

        let media_type = infer::get(content).and_then(|kind| NonEmptyText::new(kind.mime_type()).ok());

        Ok(FileMetadata {
            hash_algorithm: NonEmptyText::new(HASH_ALGORITHM)
                .map_err(|e| FilesError::InvalidPath(e.to_string()))?,
            hash,
            relative_path,
            size_bytes: content.len() as u64,
            media_type,
            original_filename,
            stored_at: Utc::now(),
        })
    }

    /// Reads a stored blob by its SHA-256 hash.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::Uuid` for a malformed digest, `FilesError::NotFound` if nothing is
    /// stored under it, or `FilesError::Io` if the read fails.
    pub fn read(&self, hash: &str) -> Result<Vec<u8>, FilesError> {
        let hash = Sha256Hash::parse(hash)?;
        let storage_path = self.compute_storage_path(hash.as_str())?;

        if !storage_path.is_file() {
            return Err(FilesError::NotFound(hash.to_string()));
        }

        fs::read(&storage_path).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read file from {}: {}", storage_path.display(), e),
            ))
        })
    }

    /// Absolute storage path for a digest.
    fn compute_storage_path(&self, hash_hex: &str) -> Result<PathBuf, FilesError> {
        Ok(self
            .root_directory
            .join(self.compute_relative_path(hash_hex)?.as_str()))
    }

    /// Path relative to the upload root:
    /// `<s1>/<s2>/<patient_id>/files/sha256/<h1>/<h2>/<hash>`.
    fn compute_relative_path(&self, hash_hex: &str) -> Result<NonEmptyText, FilesError> {
        if hash_hex.len() < 4 {
            return Err(FilesError::InvalidPath(format!(
                "hash too short to shard: {}",
                hash_hex
            )));
        }
        let patient_dir = self.patient_id.sharded_dir(Path::new(""));
        let path = patient_dir
            .join(FILES_FOLDER_NAME)
            .join(HASH_ALGORITHM)
            .join(&hash_hex[0..2])
            .join(&hash_hex[2..4])
            .join(hash_hex);

        let path = path
            .to_str()
            .ok_or_else(|| FilesError::InvalidPath(path.display().to_string()))?
            .replace('\\', "/");
        NonEmptyText::new(path).map_err(|e| FilesError::InvalidPath(e.to_string()))
    }

    /// Returns the patient's directory under the upload root.
    #[must_use]
    pub fn patient_root(&self) -> PathBuf {
        self.patient_id.sharded_dir(&self.root_directory)
    }

    /// Returns the patient identifier this service is scoped to.
    #[must_use]
    pub fn patient_id(&self) -> &ShardableUuid {
        &self.patient_id
    }
}

/// Reduces an uploader-supplied filename to its final component.
fn sanitise_filename(filename: &str) -> Result<NonEmptyText, FilesError> {
    let last = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if last.is_empty() || last == "." || last == ".." {
        return Err(FilesError::InvalidPath(format!(
            "filename has no usable final component: '{}'",
            filename
        )));
    }
    NonEmptyText::new(last).map_err(|e| FilesError::InvalidPath(e.to_string()))
}
