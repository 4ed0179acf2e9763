//! Permission matrix engine.
//!
//! Maps `(role, is_manager)` to the UI-facing capability bundle. The mapping
//! lives in a single data table; every other permission-adjacent computation
//! (navigation, parity checks, the permissions endpoint) derives from it.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::role::Role;
use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum DashboardTab {
    MyBadges,
    Team,
    Issuance,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SidebarGroup {
    Base,
    Team,
    Issuance,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlatCapabilities {
    pub can_view_team: bool,
    pub can_issue_badges: bool,
    pub can_manage_users: bool,
}

/// Derived capability bundle for one `(role, is_manager)` pair.
///
/// Built fresh on every call and never cached across requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionDecision {
    pub role: Role,
    pub is_manager: bool,
    pub dashboard_tabs: Vec<DashboardTab>,
    pub sidebar_groups: Vec<SidebarGroup>,
    pub permissions: FlatCapabilities,
}

impl PermissionDecision {
    pub fn has_tab(&self, tab: DashboardTab) -> bool {
        self.dashboard_tabs.contains(&tab)
    }

    pub fn has_group(&self, group: SidebarGroup) -> bool {
        self.sidebar_groups.contains(&group)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MatrixRow {
    pub role: Role,
    pub is_manager: bool,
    pub dashboard_tabs: &'static [DashboardTab],
    pub sidebar_groups: &'static [SidebarGroup],
    pub permissions: FlatCapabilities,
}

const fn caps(can_view_team: bool, can_issue_badges: bool, can_manage_users: bool) -> FlatCapabilities {
    FlatCapabilities {
        can_view_team,
        can_issue_badges,
        can_manage_users,
    }
}

use DashboardTab as T;
use SidebarGroup as G;

/// Canonical matrix, two rows per role (`is_manager` false then true), in
/// `Role::matrix_slot` order.
///
/// The MANAGER rows carry the base tier until the role's capability row is
/// settled; they are spelled out so changing them is a one-line edit here.
pub const PERMISSION_MATRIX: [MatrixRow; 8] = [
    MatrixRow {
        role: Role::Employee,
        is_manager: false,
        dashboard_tabs: &[T::MyBadges],
        sidebar_groups: &[G::Base],
        permissions: caps(false, false, false),
    },
    MatrixRow {
        role: Role::Employee,
        is_manager: true,
        dashboard_tabs: &[T::MyBadges, T::Team],
        sidebar_groups: &[G::Base, G::Team],
        permissions: caps(true, false, false),
    },
    MatrixRow {
        role: Role::Issuer,
        is_manager: false,
        dashboard_tabs: &[T::MyBadges, T::Issuance],
        sidebar_groups: &[G::Base, G::Issuance],
        permissions: caps(false, true, false),
    },
    MatrixRow {
        role: Role::Issuer,
        is_manager: true,
        dashboard_tabs: &[T::MyBadges, T::Team, T::Issuance],
        sidebar_groups: &[G::Base, G::Team, G::Issuance],
        permissions: caps(true, true, false),
    },
    MatrixRow {
        role: Role::Admin,
        is_manager: false,
        dashboard_tabs: &[T::MyBadges, T::Issuance, T::Admin],
        sidebar_groups: &[G::Base, G::Issuance, G::Admin],
        permissions: caps(false, true, true),
    },
    MatrixRow {
        role: Role::Admin,
        is_manager: true,
        dashboard_tabs: &[T::MyBadges, T::Team, T::Issuance, T::Admin],
        sidebar_groups: &[G::Base, G::Team, G::Issuance, G::Admin],
        permissions: caps(true, true, true),
    },
    MatrixRow {
        role: Role::Manager,
        is_manager: false,
        dashboard_tabs: &[T::MyBadges],
        sidebar_groups: &[G::Base],
        permissions: caps(false, false, false),
    },
    MatrixRow {
        role: Role::Manager,
        is_manager: true,
        dashboard_tabs: &[T::MyBadges, T::Team],
        sidebar_groups: &[G::Base, G::Team],
        permissions: caps(true, false, false),
    },
];

pub(crate) const fn row_index(role: Role, is_manager: bool) -> usize {
    role.matrix_slot() * 2 + is_manager as usize
}

pub fn matrix_row(role: Role, is_manager: bool) -> &'static MatrixRow {
    &PERMISSION_MATRIX[row_index(role, is_manager)]
}

/// Compute the full permission decision for a role and manager flag.
///
/// Total over the role enum; there is no failure mode for well-formed input.
pub fn compute_permissions(role: Role, is_manager: bool) -> PermissionDecision {
    let row = matrix_row(role, is_manager);
    PermissionDecision {
        role,
        is_manager,
        dashboard_tabs: row.dashboard_tabs.to_vec(),
        sidebar_groups: row.sidebar_groups.to_vec(),
        permissions: row.permissions,
    }
}

/// Same as [`compute_permissions`] for a role that has not been parsed yet.
pub fn compute_permissions_for(role: &str, is_manager: bool) -> Result<PermissionDecision, AppError> {
    let role: Role = role.parse().map_err(|err: super::role::UnknownRole| {
        tracing::error!(role = %err.0, "role outside the closed enum reached the permission engine");
        AppError::configuration(err.to_string())
    })?;
    Ok(compute_permissions(role, is_manager))
}
