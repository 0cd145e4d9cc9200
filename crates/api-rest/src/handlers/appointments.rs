use crate::error::ApiResult;
use crate::extract::{AppJson, AppQuery, Bearer, MaybeBearer};
use crate::state::AppState;
use api_shared::convert::parse_id;
use api_shared::{AppointmentReq, AppointmentRes, AppointmentStatusReq, PageQuery};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use multicare_core::model::{AppointmentStatus, NewAppointment, Page};
use multicare_core::workflow::{list_appointments, schedule, update_appointment_status};

#[utoipa::path(
    post,
    path = "/appointments",
    tag = "appointments",
    request_body = AppointmentReq,
    responses(
        (status = 201, description = "Appointment requested (pending)", body = AppointmentRes),
        (status = 404, description = "No such patient or doctor", body = api_shared::ErrorRes)
    )
)]
/// Requests an appointment. Open to anonymous callers; new appointments start `pending`.
pub async fn create(
    State(state): State<AppState>,
    bearer: MaybeBearer,
    AppJson(req): AppJson<AppointmentReq>,
) -> ApiResult<(StatusCode, Json<AppointmentRes>)> {
    let new = NewAppointment::try_from(req)?;
    let appointment = state
        .run(move |conn, _| {
            let actor = bearer.actor(conn)?;
            schedule(conn, actor.as_ref(), new)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(appointment.into())))
}

#[utoipa::path(
    get,
    path = "/appointments",
    tag = "appointments",
    params(PageQuery),
    responses(
        (status = 200, description = "Appointments by time", body = [AppointmentRes])
    ),
    security(("bearer" = []))
)]
pub async fn list(
    State(state): State<AppState>,
    bearer: Bearer,
    AppQuery(query): AppQuery<PageQuery>,
) -> ApiResult<Json<Vec<AppointmentRes>>> {
    let page = Page::new(query.skip, query.limit);
    let appointments = state
        .run(move |conn, _| list_appointments(conn, &bearer.actor(conn)?, page))
        .await?;
    Ok(Json(appointments.into_iter().map(AppointmentRes::from).collect()))
}

#[utoipa::path(
    put,
    path = "/appointments/{id}/status",
    tag = "appointments",
    params(("id" = String, Path, description = "Appointment id")),
    request_body = AppointmentStatusReq,
    responses(
        (status = 200, description = "Status changed", body = AppointmentRes),
        (status = 400, description = "Unknown status or appointment already closed", body = api_shared::ErrorRes),
        (status = 404, description = "No such appointment", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
pub async fn update_status(
    State(state): State<AppState>,
    bearer: Bearer,
    Path(id): Path<String>,
    AppJson(req): AppJson<AppointmentStatusReq>,
) -> ApiResult<Json<AppointmentRes>> {
    let id = parse_id("id", &id)?;
    let status: AppointmentStatus = req.status.parse()?;
    let appointment = state
        .run(move |conn, _| {
            let actor = bearer.actor(conn)?;
            update_appointment_status(conn, &actor, &id, status)
        })
        .await?;
    Ok(Json(appointment.into()))
}
