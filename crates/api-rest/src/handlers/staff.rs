use crate::error::ApiResult;
use crate::extract::{AppJson, AppQuery, Bearer};
use crate::state::AppState;
use api_shared::{StaffQuery, StaffReq, StaffRes};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use multicare_core::model::{NewStaff, Page, Role};
use multicare_core::workflow::{add_staff, list_doctors, list_staff};

#[utoipa::path(
    get,
    path = "/staff",
    tag = "staff",
    params(StaffQuery),
    responses(
        (status = 200, description = "Staff directory", body = [StaffRes])
    ),
    security(("bearer" = []))
)]
pub async fn list(
    State(state): State<AppState>,
    bearer: Bearer,
    AppQuery(query): AppQuery<StaffQuery>,
) -> ApiResult<Json<Vec<StaffRes>>> {
    let role = match query.role.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(raw.parse::<Role>()?),
        _ => None,
    };
    let page = Page::new(query.skip, query.limit);
    let staff = state
        .run(move |conn, _| list_staff(conn, &bearer.actor(conn)?, role, page))
        .await?;
    Ok(Json(staff.into_iter().map(StaffRes::from).collect()))
}

#[utoipa::path(
    post,
    path = "/staff",
    tag = "staff",
    request_body = StaffReq,
    responses(
        (status = 201, description = "Staff member added", body = StaffRes),
        (status = 400, description = "Invalid role", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Adds a directory entry without a login account.
pub async fn create(
    State(state): State<AppState>,
    bearer: Bearer,
    AppJson(req): AppJson<StaffReq>,
) -> ApiResult<(StatusCode, Json<StaffRes>)> {
    let new = NewStaff::try_from(req)?;
    let staff = state
        .run(move |conn, _| {
            let actor = bearer.actor(conn)?;
            add_staff(conn, &actor, new)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(staff.into())))
}

#[utoipa::path(
    get,
    path = "/appointments/doctors",
    tag = "appointments",
    responses(
        (status = 200, description = "Doctors a patient can book with", body = [StaffRes])
    )
)]
pub async fn doctors(State(state): State<AppState>) -> ApiResult<Json<Vec<StaffRes>>> {
    let doctors = state.run(|conn, _| list_doctors(conn)).await?;
    Ok(Json(doctors.into_iter().map(StaffRes::from).collect()))
}
