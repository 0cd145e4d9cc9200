use crate::error::ApiResult;
use crate::extract::{AppForm, AppJson, Bearer};
use crate::state::AppState;
use api_shared::{SignupReq, TokenForm, TokenRes, UserRes};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::SecondsFormat;
use multicare_core::auth::{login, revoke_token, signup, Signup};

#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "auth",
    request_body = SignupReq,
    responses(
        (status = 201, description = "Account created", body = UserRes),
        (status = 400, description = "Invalid input or email already registered", body = api_shared::ErrorRes)
    )
)]
/// Creates an account. Doctor and nurse accounts also appear in the staff directory.
pub async fn signup_user(
    State(state): State<AppState>,
    AppJson(req): AppJson<SignupReq>,
) -> ApiResult<(StatusCode, Json<UserRes>)> {
    let new = Signup::try_from(req)?;
    let user = state.run(move |conn, cfg| signup(conn, cfg, new)).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    post,
    path = "/auth/token",
    tag = "auth",
    request_body(content = TokenForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Bearer token issued", body = TokenRes),
        (status = 401, description = "Incorrect email or password", body = api_shared::ErrorRes)
    )
)]
/// OAuth2 password flow: exchanges `username` (email) and `password` for a bearer token.
pub async fn issue_token(
    State(state): State<AppState>,
    AppForm(form): AppForm<TokenForm>,
) -> ApiResult<Json<TokenRes>> {
    let issued = state
        .run(move |conn, cfg| login(conn, cfg, &form.username, &form.password))
        .await?;
    tracing::info!(user_id = %issued.user.id, "token issued");
    Ok(Json(TokenRes {
        access_token: issued.access_token,
        token_type: "bearer".into(),
        expires_at: issued.expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        user: issued.user.into(),
    }))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses(
        (status = 204, description = "Token revoked"),
        (status = 401, description = "Missing, unknown or expired token", body = api_shared::ErrorRes)
    ),
    security(("bearer" = []))
)]
/// Revokes the bearer token the request was made with.
pub async fn logout(State(state): State<AppState>, bearer: Bearer) -> ApiResult<StatusCode> {
    state
        .run(move |conn, _| {
            let actor = bearer.actor(conn)?;
            revoke_token(conn, &bearer.0)?;
            tracing::info!(user_id = %actor.user_id, "token revoked");
            Ok(())
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
