use crate::error::{ApiError, ApiResult};
use crate::extract::Bearer;
use crate::state::AppState;
use api_shared::convert::parse_id;
use api_shared::DocumentRes;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use multicare_core::workflow::{document_content, documents_for_patient, upload_document};
use multicare_core::NonEmptyText;

const FALLBACK_FILENAME: &str = "upload";
const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

struct Upload {
    patient_id: Option<String>,
    document_type: Option<String>,
    file: Option<(String, Vec<u8>)>,
}

async fn read_upload(mut multipart: Multipart) -> ApiResult<Upload> {
    let mut upload = Upload {
        patient_id: None,
        document_type: None,
        file: None,
    };
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "patient_id" => upload.patient_id = Some(field.text().await?),
            "document_type" => upload.document_type = Some(field.text().await?),
            "file" => {
                let filename = field
                    .file_name()
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or(FALLBACK_FILENAME)
                    .to_string();
                let bytes = field.bytes().await?;
                upload.file = Some((filename, bytes.to_vec()));
            }
            other => tracing::debug!(field = other, "ignoring multipart field"),
        }
    }
    Ok(upload)
}

fn missing(field: &str) -> ApiError {
    ApiError::BadRequest(format!("multipart field '{field}' is required"))
}

#[utoipa::path(
    post,
    path = "/documents/upload",
    tag = "documents",
    request_body(content = api_shared::DocumentUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Document stored", body = DocumentRes),
        (status = 400, description = "Missing field", body = api_shared::ErrorRes),
        (status = 404, description = "No such patient", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
pub async fn upload(
    State(state): State<AppState>,
    bearer: Bearer,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<DocumentRes>)> {
    // Caller first; the body is only buffered for an authenticated request.
    let actor = state.run(move |conn, _| bearer.actor(conn)).await?;
    let upload = read_upload(multipart).await?;
    let patient_id = parse_id(
        "patient_id",
        upload.patient_id.as_deref().ok_or_else(|| missing("patient_id"))?,
    )?;
    let document_type = upload
        .document_type
        .as_deref()
        .and_then(|t| NonEmptyText::new(t).ok())
        .ok_or_else(|| missing("document_type"))?;
    let (filename, bytes) = upload.file.ok_or_else(|| missing("file"))?;

    let document = state
        .run(move |conn, cfg| {
            upload_document(conn, cfg, &actor, &patient_id, document_type, &filename, &bytes)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(document.into())))
}

#[utoipa::path(
    get,
    path = "/documents/patient/{id}",
    tag = "documents",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Documents for the patient", body = [DocumentRes]),
        (status = 404, description = "No such patient", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
pub async fn for_patient(
    State(state): State<AppState>,
    bearer: Bearer,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<DocumentRes>>> {
    let patient_id = parse_id("id", &id)?;
    let documents = state
        .run(move |conn, _| documents_for_patient(conn, &bearer.actor(conn)?, &patient_id))
        .await?;
    Ok(Json(documents.into_iter().map(DocumentRes::from).collect()))
}

#[utoipa::path(
    get,
    path = "/documents/{id}/content",
    tag = "documents",
    params(("id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "Raw document bytes", content_type = "application/octet-stream"),
        (status = 404, description = "No such document", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Returns the stored bytes with the detected media type.
pub async fn content(
    State(state): State<AppState>,
    bearer: Bearer,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let document_id = parse_id("id", &id)?;
    let (document, bytes) = state
        .run(move |conn, cfg| document_content(conn, cfg, &bearer.actor(conn)?, &document_id))
        .await?;

    let media_type = document
        .media_type
        .as_ref()
        .and_then(|m| HeaderValue::from_str(m.as_str()).ok())
        .unwrap_or_else(|| HeaderValue::from_static(FALLBACK_MEDIA_TYPE));
    Ok(([(header::CONTENT_TYPE, media_type)], bytes).into_response())
}
