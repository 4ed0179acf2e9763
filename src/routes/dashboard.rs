//! Dashboard tabs as protected operations.
//!
//! Each tab's data endpoint carries its own declaration. `TAB_ROUTES` pairs
//! tabs with those declarations so the parity harness can check that the
//! matrix never shows a tab whose route would refuse the caller.

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::{DashboardTab, GuardDeclaration, IdentityClaim, Role};

pub const EMPLOYEE: GuardDeclaration =
    GuardDeclaration::roles(&[Role::Employee, Role::Issuer, Role::Manager, Role::Admin]);
pub const TEAM: GuardDeclaration = GuardDeclaration::manager();
pub const ISSUER: GuardDeclaration = GuardDeclaration::roles(&[Role::Issuer, Role::Admin]);
pub const ADMIN: GuardDeclaration = GuardDeclaration::roles(&[Role::Admin]);

pub const TAB_ROUTES: [(DashboardTab, GuardDeclaration); 4] = [
    (DashboardTab::MyBadges, EMPLOYEE),
    (DashboardTab::Team, TEAM),
    (DashboardTab::Issuance, ISSUER),
    (DashboardTab::Admin, ADMIN),
];

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub tab: DashboardTab,
    pub user_id: Uuid,
    pub role: Role,
}

fn tab_response(tab: DashboardTab, claim: IdentityClaim) -> Json<DashboardResponse> {
    Json(DashboardResponse {
        tab,
        user_id: claim.user_id,
        role: claim.role,
    })
}

#[utoipa::path(
    get,
    path = "/api/dashboard/employee",
    tag = "Dashboard",
    responses((status = 200, description = "Personal badge wallet tab", body = DashboardResponse)),
    security(("bearerAuth" = []))
)]
pub async fn employee(claim: IdentityClaim) -> Json<DashboardResponse> {
    tab_response(DashboardTab::MyBadges, claim)
}

#[utoipa::path(
    get,
    path = "/api/dashboard/team",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Team tab", body = DashboardResponse),
        (status = 403, description = "Manager access required")
    ),
    security(("bearerAuth" = []))
)]
pub async fn team(claim: IdentityClaim) -> Json<DashboardResponse> {
    tab_response(DashboardTab::Team, claim)
}

#[utoipa::path(
    get,
    path = "/api/dashboard/issuer",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Issuance tab", body = DashboardResponse),
        (status = 403, description = "Insufficient role")
    ),
    security(("bearerAuth" = []))
)]
pub async fn issuer(claim: IdentityClaim) -> Json<DashboardResponse> {
    tab_response(DashboardTab::Issuance, claim)
}

#[utoipa::path(
    get,
    path = "/api/dashboard/admin",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Administration tab", body = DashboardResponse),
        (status = 403, description = "Insufficient role")
    ),
    security(("bearerAuth" = []))
)]
pub async fn admin(claim: IdentityClaim) -> Json<DashboardResponse> {
    tab_response(DashboardTab::Admin, claim)
}
