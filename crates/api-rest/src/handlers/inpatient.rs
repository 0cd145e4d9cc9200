use crate::error::ApiResult;
use crate::extract::{AppJson, AppQuery, Bearer};
use crate::state::AppState;
use api_shared::convert::parse_id;
use api_shared::{
    AdmissionRes, AdmitReq, BedReq, BedRes, BedUpdateReq, IpdRowRes, PageQuery,
    TransferQuery,
};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use multicare_core::model::{NewBed, Page};
use multicare_core::reporting::ipd_active;
use multicare_core::workflow::{
    add_bed, admit, assign_bed, discharge, list_beds, transfer, BedAssignment,
};
use multicare_core::{CoreError, NonEmptyText};

#[utoipa::path(
    get,
    path = "/patients/ipd",
    tag = "inpatient",
    responses(
        (status = 200, description = "Active admissions", body = [IpdRowRes])
    ),
    security(("bearer" = []))
)]
pub async fn ipd(State(state): State<AppState>, bearer: Bearer) -> ApiResult<Json<Vec<IpdRowRes>>> {
    let rows = state
        .run(move |conn, _| ipd_active(conn, &bearer.actor(conn)?))
        .await?;
    Ok(Json(rows.into_iter().map(IpdRowRes::from).collect()))
}

#[utoipa::path(
    post,
    path = "/patients/ipd",
    tag = "inpatient",
    request_body = AdmitReq,
    responses(
        (status = 201, description = "Patient admitted", body = AdmissionRes),
        (status = 400, description = "Patient already admitted", body = api_shared::ErrorRes),
        (status = 403, description = "Doctors only", body = api_shared::ErrorRes),
        (status = 404, description = "No such patient", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Admits a patient. The calling doctor is recorded as the admitting doctor.
pub async fn admit_patient(
    State(state): State<AppState>,
    bearer: Bearer,
    AppJson(req): AppJson<AdmitReq>,
) -> ApiResult<(StatusCode, Json<AdmissionRes>)> {
    let patient_id = parse_id("patient_id", &req.patient_id)?;
    let room = NonEmptyText::new(&req.room_number)
        .map_err(|_| CoreError::InvalidInput("room_number must not be empty".into()))?;
    let admission = state
        .run(move |conn, _| {
            let actor = bearer.actor(conn)?;
            admit(conn, &actor, &patient_id, room)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(admission.into())))
}

#[utoipa::path(
    post,
    path = "/patients/ipd/{admission_id}/discharge",
    tag = "inpatient",
    params(("admission_id" = String, Path, description = "Admission id")),
    responses(
        (status = 200, description = "Admission discharged", body = AdmissionRes),
        (status = 400, description = "Admission is not active", body = api_shared::ErrorRes),
        (status = 404, description = "No such admission", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
pub async fn discharge_admission(
    State(state): State<AppState>,
    bearer: Bearer,
    Path(admission_id): Path<String>,
) -> ApiResult<Json<AdmissionRes>> {
    let admission_id = parse_id("admission_id", &admission_id)?;
    let admission = state
        .run(move |conn, _| {
            let actor = bearer.actor(conn)?;
            discharge(conn, &actor, &admission_id)
        })
        .await?;
    Ok(Json(admission.into()))
}

#[utoipa::path(
    post,
    path = "/patients/ipd/{admission_id}/transfer",
    tag = "inpatient",
    params(
        ("admission_id" = String, Path, description = "Admission id"),
        TransferQuery
    ),
    responses(
        (status = 200, description = "Admission transferred", body = AdmissionRes),
        (status = 400, description = "Admission is not active", body = api_shared::ErrorRes),
        (status = 404, description = "No such admission", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Marks the admission `Transferred` and moves it to the department's room.
pub async fn transfer_admission(
    State(state): State<AppState>,
    bearer: Bearer,
    Path(admission_id): Path<String>,
    AppQuery(query): AppQuery<TransferQuery>,
) -> ApiResult<Json<AdmissionRes>> {
    let admission_id = parse_id("admission_id", &admission_id)?;
    let admission = state
        .run(move |conn, _| {
            let actor = bearer.actor(conn)?;
            transfer(conn, &actor, &admission_id, query.new_department_id)
        })
        .await?;
    Ok(Json(admission.into()))
}

#[utoipa::path(
    get,
    path = "/beds",
    tag = "beds",
    params(PageQuery),
    responses(
        (status = 200, description = "Beds", body = [BedRes])
    ),
    security(("bearer" = []))
)]
pub async fn beds(
    State(state): State<AppState>,
    bearer: Bearer,
    AppQuery(query): AppQuery<PageQuery>,
) -> ApiResult<Json<Vec<BedRes>>> {
    let page = Page::new(query.skip, query.limit);
    let beds = state
        .run(move |conn, _| list_beds(conn, &bearer.actor(conn)?, page))
        .await?;
    Ok(Json(beds.into_iter().map(BedRes::from).collect()))
}

#[utoipa::path(
    post,
    path = "/beds",
    tag = "beds",
    request_body = BedReq,
    responses(
        (status = 201, description = "Bed added", body = BedRes),
        (status = 400, description = "Bed number already exists", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
pub async fn create_bed(
    State(state): State<AppState>,
    bearer: Bearer,
    AppJson(req): AppJson<BedReq>,
) -> ApiResult<(StatusCode, Json<BedRes>)> {
    let new = NewBed::try_from(req)?;
    let bed = state
        .run(move |conn, _| {
            let actor = bearer.actor(conn)?;
            add_bed(conn, &actor, new)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(bed.into())))
}

#[utoipa::path(
    put,
    path = "/beds/{id}",
    tag = "beds",
    params(("id" = String, Path, description = "Bed id")),
    request_body = BedUpdateReq,
    responses(
        (status = 200, description = "Bed updated", body = BedRes),
        (status = 400, description = "Bed held by another patient or inconsistent flags", body = api_shared::ErrorRes),
        (status = 404, description = "No such bed or patient", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Assigns the bed to `patient_id`, or frees it when no patient is given.
pub async fn update_bed(
    State(state): State<AppState>,
    bearer: Bearer,
    Path(id): Path<String>,
    AppJson(req): AppJson<BedUpdateReq>,
) -> ApiResult<Json<BedRes>> {
    let bed_id = parse_id("id", &id)?;
    let patient_id = match req.patient_id.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(parse_id("patient_id", raw)?),
        _ => None,
    };
    let assignment = BedAssignment {
        is_occupied: req.is_occupied,
        patient_id,
    };
    let bed = state
        .run(move |conn, _| {
            let actor = bearer.actor(conn)?;
            assign_bed(conn, &actor, &bed_id, assignment)
        })
        .await?;
    Ok(Json(bed.into()))
}
