//! Capability endpoints for the signed-in user.
//!
//! Both are computed from the token claims alone, without touching the
//! database, and carry no PII.

use axum::Json;

use crate::authz::{compute_permissions, GuardDeclaration, IdentityClaim, PermissionDecision};
use crate::navigation::{visible_sections, NavSection};

pub const ME: GuardDeclaration = GuardDeclaration::authenticated();

#[utoipa::path(
    get,
    path = "/api/users/me/permissions",
    tag = "Users",
    responses(
        (status = 200, description = "Permissions computed from the token claims", body = PermissionDecision),
        (status = 401, description = "Authentication required")
    ),
    security(("bearerAuth" = []))
)]
pub async fn my_permissions(claim: IdentityClaim) -> Json<PermissionDecision> {
    Json(compute_permissions(claim.role, claim.is_manager()))
}

#[utoipa::path(
    get,
    path = "/api/users/me/navigation",
    tag = "Users",
    responses(
        (status = 200, description = "Sidebar sections visible to the caller", body = Vec<NavSection>),
        (status = 401, description = "Authentication required")
    ),
    security(("bearerAuth" = []))
)]
pub async fn my_navigation(claim: IdentityClaim) -> Json<Vec<NavSection>> {
    let decision = compute_permissions(claim.role, claim.is_manager());
    Json(visible_sections(&decision))
}
