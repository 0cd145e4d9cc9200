use crate::error::ApiResult;
use crate::extract::{AppJson, AppQuery, Bearer, MaybeBearer};
use crate::state::AppState;
use api_shared::convert::{parse_date, parse_id};
use api_shared::{OpdQuery, OpdRowRes, PageQuery, PatientRes, RegisterPatientReq, TriageReq};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use multicare_core::model::{NewPatient, Page, TriageLevel};
use multicare_core::reporting::opd_by_date;
use multicare_core::workflow::{
    get_patient, high_priority_alerts, list_patients, register_patient, set_triage,
};

#[utoipa::path(
    post,
    path = "/patients/register",
    tag = "patients",
    request_body = RegisterPatientReq,
    responses(
        (status = 201, description = "Patient registered", body = PatientRes),
        (status = 400, description = "Invalid input", body = api_shared::ErrorRes)
    )
)]
/// Self-service intake. A bearer token is optional; when sent it is recorded as `registered_by`.
pub async fn register(
    State(state): State<AppState>,
    bearer: MaybeBearer,
    AppJson(req): AppJson<RegisterPatientReq>,
) -> ApiResult<(StatusCode, Json<PatientRes>)> {
    let new = NewPatient::try_from(req)?;
    let patient = state
        .run(move |conn, _| {
            let actor = bearer.actor(conn)?;
            register_patient(conn, actor.as_ref(), new)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(patient.into())))
}

#[utoipa::path(
    get,
    path = "/patients",
    tag = "patients",
    params(PageQuery),
    responses(
        (status = 200, description = "Patients in registration order", body = [PatientRes]),
        (status = 401, description = "Not authenticated", body = api_shared::ErrorRes),
        (status = 403, description = "Staff only", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
pub async fn list(
    State(state): State<AppState>,
    bearer: Bearer,
    AppQuery(query): AppQuery<PageQuery>,
) -> ApiResult<Json<Vec<PatientRes>>> {
    let page = Page::new(query.skip, query.limit);
    let patients = state
        .run(move |conn, _| list_patients(conn, &bearer.actor(conn)?, page))
        .await?;
    Ok(Json(patients.into_iter().map(PatientRes::from).collect()))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    tag = "patients",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient", body = PatientRes),
        (status = 404, description = "No such patient", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
pub async fn get(
    State(state): State<AppState>,
    bearer: Bearer,
    Path(id): Path<String>,
) -> ApiResult<Json<PatientRes>> {
    let id = parse_id("id", &id)?;
    let patient = state
        .run(move |conn, _| get_patient(conn, &bearer.actor(conn)?, &id))
        .await?;
    Ok(Json(patient.into()))
}

#[utoipa::path(
    put,
    path = "/patients/{id}/triage",
    tag = "patients",
    params(("id" = String, Path, description = "Patient id")),
    request_body = TriageReq,
    responses(
        (status = 200, description = "Triage level updated", body = PatientRes),
        (status = 400, description = "Unknown triage level", body = api_shared::ErrorRes),
        (status = 404, description = "No such patient", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
pub async fn triage(
    State(state): State<AppState>,
    bearer: Bearer,
    Path(id): Path<String>,
    AppJson(req): AppJson<TriageReq>,
) -> ApiResult<Json<PatientRes>> {
    let patient = state
        .run(move |conn, _| {
            let actor = bearer.actor(conn)?;
            let id = parse_id("id", &id)?;
            let level: TriageLevel = req.triage_level.parse()?;
            set_triage(conn, &actor, &id, level)
        })
        .await?;
    Ok(Json(patient.into()))
}

#[utoipa::path(
    get,
    path = "/patients/alerts/high-priority",
    tag = "patients",
    responses(
        (status = 200, description = "Patients triaged Resuscitation or Emergency", body = [PatientRes])
    ),
    security(("bearer" = []))
)]
pub async fn alerts(
    State(state): State<AppState>,
    bearer: Bearer,
) -> ApiResult<Json<Vec<PatientRes>>> {
    let patients = state
        .run(move |conn, _| high_priority_alerts(conn, &bearer.actor(conn)?))
        .await?;
    Ok(Json(patients.into_iter().map(PatientRes::from).collect()))
}

#[utoipa::path(
    get,
    path = "/patients/opd",
    tag = "patients",
    params(OpdQuery),
    responses(
        (status = 200, description = "Appointments on the given day", body = [OpdRowRes]),
        (status = 400, description = "Malformed date", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Outpatient view for one calendar day.
pub async fn opd(
    State(state): State<AppState>,
    bearer: Bearer,
    AppQuery(query): AppQuery<OpdQuery>,
) -> ApiResult<Json<Vec<OpdRowRes>>> {
    let day = parse_date("date_filter", &query.date_filter)?;
    let rows = state
        .run(move |conn, _| opd_by_date(conn, &bearer.actor(conn)?, day))
        .await?;
    Ok(Json(rows.into_iter().map(OpdRowRes::from).collect()))
}
