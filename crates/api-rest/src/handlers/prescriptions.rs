use crate::error::ApiResult;
use crate::extract::{AppJson, Bearer};
use crate::state::AppState;
use api_shared::convert::parse_id;
use api_shared::{PrescriptionReq, PrescriptionRes};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use multicare_core::model::NewPrescription;
use multicare_core::workflow::{create_prescription, prescriptions_for_patient};

#[utoipa::path(
    post,
    path = "/prescriptions",
    tag = "prescriptions",
    request_body = PrescriptionReq,
    responses(
        (status = 201, description = "Prescription written", body = PrescriptionRes),
        (status = 400, description = "No medications or incomplete lines", body = api_shared::ErrorRes),
        (status = 403, description = "Doctors only", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
pub async fn create(
    State(state): State<AppState>,
    bearer: Bearer,
    AppJson(req): AppJson<PrescriptionReq>,
) -> ApiResult<(StatusCode, Json<PrescriptionRes>)> {
    let new = NewPrescription::try_from(req)?;
    let prescription = state
        .run(move |conn, _| {
            let actor = bearer.actor(conn)?;
            create_prescription(conn, &actor, new)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(prescription.into())))
}

#[utoipa::path(
    get,
    path = "/prescriptions/patient/{id}",
    tag = "prescriptions",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Prescriptions, newest first", body = [PrescriptionRes]),
        (status = 404, description = "No such patient", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
pub async fn for_patient(
    State(state): State<AppState>,
    bearer: Bearer,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<PrescriptionRes>>> {
    let patient_id = parse_id("id", &id)?;
    let prescriptions = state
        .run(move |conn, _| prescriptions_for_patient(conn, &bearer.actor(conn)?, &patient_id))
        .await?;
    Ok(Json(prescriptions.into_iter().map(PrescriptionRes::from).collect()))
}
