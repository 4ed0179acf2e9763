//! Request-time wiring of the guard layer.
//!
//! `authenticate` runs once per protected router and attaches the caller's
//! [`IdentityClaim`]; `authorize` is attached per route together with that
//! route's [`GuardDeclaration`].

use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::MethodRouter;

use super::guard::{can_activate, GuardDeclaration};
use super::principal::IdentityClaim;
use crate::app::AppState;
use crate::audit::{self, AuditBus, DenialEvent};
use crate::errors::AppError;
use crate::jwt;

pub async fn authenticate(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, AppError> {
    let token = jwt::token_from_headers(req.headers())
        .ok_or_else(|| AppError::unauthorized("Authentication required"))?;
    let identity = state.jwt.decode(token)?.into_identity()?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Per-route guard state: the declaration plus the collaborator denials are reported to.
#[derive(Clone)]
pub struct RouteGuard {
    pub declaration: GuardDeclaration,
    audit: AuditBus,
}

impl RouteGuard {
    pub fn new(declaration: GuardDeclaration, audit: AuditBus) -> Self {
        Self { declaration, audit }
    }
}

pub async fn authorize(State(guard): State<RouteGuard>, req: Request, next: Next) -> Result<Response, AppError> {
    let claim = req.extensions().get::<IdentityClaim>().cloned();

    match can_activate(claim.as_ref(), &guard.declaration) {
        Ok(()) => Ok(next.run(req).await),
        Err(denial) => {
            tracing::debug!(
                user_id = ?claim.as_ref().map(|c| c.user_id),
                role = ?claim.as_ref().map(|c| c.role),
                path = %req.uri().path(),
                reason = %denial,
                "access denied"
            );
            audit::record_denial(
                &guard.audit,
                DenialEvent::new(claim.as_ref(), req.method().as_str(), req.uri().path(), &denial),
            );
            Err(denial.into())
        }
    }
}

/// Attach a declaration to a method router.
pub fn guarded(route: MethodRouter<AppState>, state: &AppState, declaration: GuardDeclaration) -> MethodRouter<AppState> {
    route.route_layer(middleware::from_fn_with_state(
        RouteGuard::new(declaration, state.audit.clone()),
        authorize,
    ))
}
