/// Name of the per-patient folder that holds document blobs.
pub const FILES_FOLDER_NAME: &str = "files";

/// Hashing algorithm recorded in [`crate::FileMetadata`] and used as a path segment.
pub const HASH_ALGORITHM: &str = "sha256";
