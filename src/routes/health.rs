use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub db_ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_error: Option<String>,
    /// Longest time a manager-flag change can take to reach a session.
    pub claim_staleness_bound_secs: i64,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, description = "Health check", body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_check = sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&state.pool).await;
    let db_error = db_check.err().map(|e| e.to_string());

    Json(HealthResponse {
        status: if db_error.is_none() { "ok" } else { "degraded" },
        db_ok: db_error.is_none(),
        db_error,
        claim_staleness_bound_secs: state.jwt.expires_in_secs(),
    })
}
