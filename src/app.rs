use std::sync::Arc;

use axum::http::Method;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::audit::{init_audit_bus, start_denial_listener, AuditBus};
use crate::authz::middleware::{authenticate, guarded};
use crate::errors::AppError;
use crate::hierarchy::{ReportingHierarchy, SqliteHierarchy};
use crate::jwt::JwtConfig;
use crate::routes::{auth, dashboard, health, users};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
    pub hierarchy: Arc<dyn ReportingHierarchy>,
    pub audit: AuditBus,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig, audit: AuditBus) -> Self {
        let hierarchy = Arc::new(SqliteHierarchy::new(pool.clone()));
        Self {
            pool,
            jwt: Arc::new(jwt),
            hierarchy,
            audit,
        }
    }

    pub fn with_hierarchy(mut self, hierarchy: Arc<dyn ReportingHierarchy>) -> Self {
        self.hierarchy = hierarchy;
        self
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let jwt_config = JwtConfig::from_env()?;
    create_app_with(pool, jwt_config).await
}

pub async fn create_app_with(pool: SqlitePool, jwt: JwtConfig) -> Result<Router, AppError> {
    let (audit, audit_rx) = init_audit_bus();
    tokio::spawn(start_denial_listener(audit_rx, pool.clone()));

    Ok(build_router(AppState::new(pool, jwt, audit)))
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let public_routes = Router::new()
        .route("/api/health", get(health::health))
        .route("/api/auth/login", post(auth::login));

    // Every route below passes `authenticate` first, then its own declaration.
    let protected_routes = Router::new()
        .route("/api/auth/refresh", guarded(post(auth::refresh), &state, users::ME))
        .route("/api/users/me/permissions", guarded(get(users::my_permissions), &state, users::ME))
        .route("/api/users/me/navigation", guarded(get(users::my_navigation), &state, users::ME))
        .route("/api/dashboard/employee", guarded(get(dashboard::employee), &state, dashboard::EMPLOYEE))
        .route("/api/dashboard/team", guarded(get(dashboard::team), &state, dashboard::TEAM))
        .route("/api/dashboard/issuer", guarded(get(dashboard::issuer), &state, dashboard::ISSUER))
        .route("/api/dashboard/admin", guarded(get(dashboard::admin), &state, dashboard::ADMIN))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
