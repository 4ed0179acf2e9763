use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use axum::Json;

use crate::app::AppState;
use crate::authz::IdentityClaim;
use crate::db::users;
use crate::errors::{AppError, AppResult};
use crate::jwt::access_cookie;
use crate::models::user::{AuthResponse, DbUser, LoginRequest, SessionUser};
use crate::utils::verify_password;

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(HeaderMap, Json<AuthResponse>)> {
    let db_user = users::find_active_by_email(&state.pool, &payload.email)
        .await?
        .ok_or_else(|| AppError::unauthorized("invalid credentials"))?;

    if !verify_password(&payload.password, &db_user.password_hash)? {
        return Err(AppError::unauthorized("invalid credentials"));
    }

    issue_session(&state, db_user).await
}

/// Re-read role and reporting lines, then re-sign. This is how hierarchy
/// changes reach an existing session.
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "Auth",
    responses(
        (status = 200, description = "Token re-issued with current claims", body = AuthResponse),
        (status = 401, description = "Missing, invalid or revoked session")
    ),
    security(("bearerAuth" = []))
)]
pub async fn refresh(
    State(state): State<AppState>,
    claim: IdentityClaim,
) -> AppResult<(HeaderMap, Json<AuthResponse>)> {
    let db_user = users::find_active_by_id(&state.pool, claim.user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("account is no longer active"))?;

    if db_user.role != claim.role {
        tracing::info!(user_id = %db_user.id, from = %claim.role, to = %db_user.role, "role changed since token issuance");
    }

    issue_session(&state, db_user).await
}

async fn issue_session(state: &AppState, db_user: DbUser) -> AppResult<(HeaderMap, Json<AuthResponse>)> {
    let is_manager = state.hierarchy.has_direct_reports(db_user.id).await?;
    let token = state.jwt.encode(db_user.id, db_user.role, is_manager)?;
    let expires_in = state.jwt.expires_in_secs();

    let mut headers = HeaderMap::new();
    let cookie = access_cookie(&token, expires_in)
        .parse::<HeaderValue>()
        .map_err(|_| AppError::internal("failed to build session cookie"))?;
    headers.insert(SET_COOKIE, cookie);

    tracing::info!(user_id = %db_user.id, role = %db_user.role, is_manager, "session issued");

    Ok((
        headers,
        Json(AuthResponse {
            token,
            expires_in,
            user: SessionUser {
                id: db_user.id,
                email: db_user.email,
                role: db_user.role,
                is_manager,
            },
        }),
    ))
}
