//! HTTP error mapping.
//!
//! Every failure leaves the API as `{"error": {"code", "message"}}`. Server-side failures are
//! logged in full and reported to the client with an opaque message.

use api_shared::auth::AuthHeaderError;
use api_shared::{ErrorDetail, ErrorRes};
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::{FormRejection, JsonRejection, QueryRejection};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use multicare_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),
    /// The request could not be decoded (malformed JSON, form or query string).
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Core(err) => match err {
                CoreError::InvalidInput(m) => (StatusCode::BAD_REQUEST, "INVALID_INPUT", m.clone()),
                CoreError::DuplicateKey(m) => (StatusCode::BAD_REQUEST, "DUPLICATE_KEY", m.clone()),
                CoreError::Conflict(m) => (StatusCode::BAD_REQUEST, "CONFLICT", m.clone()),
                CoreError::NotFound { .. } => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", capitalise(&err.to_string()))
                }
                CoreError::Unauthenticated(m) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", m.clone())
                }
                CoreError::Forbidden(m) => (StatusCode::FORBIDDEN, "FORBIDDEN", m.clone()),
                other => internal(&other.to_string()),
            },
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, "INVALID_INPUT", m.clone()),
            ApiError::Internal(m) => internal(m),
        }
    }
}

fn internal(detail: &str) -> (StatusCode, &'static str, String) {
    tracing::error!(detail, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL",
        "An internal error occurred".to_string(),
    )
}

fn capitalise(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let body = ErrorRes {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<AuthHeaderError> for ApiError {
    fn from(err: AuthHeaderError) -> Self {
        ApiError::Core(CoreError::Unauthenticated(err.to_string()))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}
