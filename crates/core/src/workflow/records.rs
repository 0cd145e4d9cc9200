//! Patient documents: bytes in blob storage, metadata in the store.

use crate::access::{authorize, Actor, Capability};
use crate::config::CoreConfig;
use crate::db::{begin_write, now};
use crate::model::Document;
use crate::repositories::{documents, patients};
use crate::CoreResult;
use multicare_files::FilesService;
use multicare_types::NonEmptyText;
use multicare_uuid::ShardableUuid;
use rusqlite::Connection;

/// Stores an uploaded document for an existing patient.
///
/// The blob is written before the metadata row. Blobs are content-addressed, so a row insert
/// that fails afterwards leaves at most an unreferenced file that a later identical upload
/// reuses.
pub fn upload_document(
    conn: &mut Connection,
    cfg: &CoreConfig,
    actor: &Actor,
    patient_id: &ShardableUuid,
    document_type: NonEmptyText,
    filename: &str,
    content: &[u8],
) -> CoreResult<Document> {
    authorize(actor, Capability::Staff)?;
    patients::get(conn, patient_id)?;

    let files = FilesService::new(cfg.upload_dir(), patient_id.clone())?;
    let stored = files.add_bytes(filename, content)?;

    let document = Document {
        id: ShardableUuid::new(),
        patient_id: patient_id.clone(),
        document_name: stored.original_filename,
        document_type,
        storage_path: stored.relative_path,
        content_hash: stored.hash,
        media_type: stored.media_type,
        size_bytes: stored.size_bytes,
        uploaded_by: actor.user_id.clone(),
        uploaded_at: now(),
    };

    let tx = begin_write(conn)?;
    patients::get(&tx, patient_id)?;
    documents::insert(&tx, &document)?;
    tx.commit()?;

    tracing::info!(
        document_id = %document.id,
        patient_id = %patient_id,
        size_bytes = document.size_bytes,
        "document uploaded"
    );
    Ok(document)
}

pub fn documents_for_patient(
    conn: &Connection,
    actor: &Actor,
    patient_id: &ShardableUuid,
) -> CoreResult<Vec<Document>> {
    authorize(actor, Capability::Staff)?;
    patients::get(conn, patient_id)?;
    documents::list_for_patient(conn, patient_id)
}

/// Metadata and bytes of one document.
pub fn document_content(
    conn: &Connection,
    cfg: &CoreConfig,
    actor: &Actor,
    document_id: &ShardableUuid,
) -> CoreResult<(Document, Vec<u8>)> {
    authorize(actor, Capability::Staff)?;
    let document = documents::get(conn, document_id)?;
    let files = FilesService::new(cfg.upload_dir(), document.patient_id.clone())?;
    let bytes = files.read(document.content_hash.as_str())?;
    Ok((document, bytes))
}
