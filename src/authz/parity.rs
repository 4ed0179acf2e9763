//! Parity harness for the permission lattice.
//!
//! The matrix is computed on the server and again wherever a client derives
//! its UI surfaces. The fixture below is written in wire form, independent of
//! the engine's table, and is run against:
//! - any engine implementation ([`check_engine`]), including decisions
//!   exported by an out-of-process client ([`check_decisions`]);
//! - the guard layer ([`check_guard_alignment`]), so the UI never advertises
//!   a surface the server would refuse.

use serde::Serialize;

use super::guard::{is_allowed, GuardDeclaration};
use super::matrix::{compute_permissions, DashboardTab, PermissionDecision, SidebarGroup};
use super::principal::IdentityClaim;
use super::role::Role;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParityCase {
    pub role: Role,
    pub is_manager: bool,
    pub dashboard_tabs: &'static [&'static str],
    pub sidebar_groups: &'static [&'static str],
    pub can_view_team: bool,
    pub can_issue_badges: bool,
    pub can_manage_users: bool,
}

const fn case(
    role: Role,
    is_manager: bool,
    dashboard_tabs: &'static [&'static str],
    sidebar_groups: &'static [&'static str],
    flags: (bool, bool, bool),
) -> ParityCase {
    ParityCase {
        role,
        is_manager,
        dashboard_tabs,
        sidebar_groups,
        can_view_team: flags.0,
        can_issue_badges: flags.1,
        can_manage_users: flags.2,
    }
}

pub const CANONICAL_CASES: [ParityCase; 8] = [
    case(Role::Employee, false, &["my-badges"], &["base"], (false, false, false)),
    case(Role::Employee, true, &["my-badges", "team"], &["base", "team"], (true, false, false)),
    case(Role::Issuer, false, &["my-badges", "issuance"], &["base", "issuance"], (false, true, false)),
    case(
        Role::Issuer,
        true,
        &["my-badges", "team", "issuance"],
        &["base", "team", "issuance"],
        (true, true, false),
    ),
    case(
        Role::Admin,
        false,
        &["my-badges", "issuance", "admin"],
        &["base", "issuance", "admin"],
        (false, true, true),
    ),
    case(
        Role::Admin,
        true,
        &["my-badges", "team", "issuance", "admin"],
        &["base", "team", "issuance", "admin"],
        (true, true, true),
    ),
    case(Role::Manager, false, &["my-badges"], &["base"], (false, false, false)),
    case(Role::Manager, true, &["my-badges", "team"], &["base", "team"], (true, false, false)),
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{role}/isManager={is_manager}: {detail}")]
pub struct ParityMismatch {
    pub role: Role,
    pub is_manager: bool,
    pub detail: String,
}

impl ParityMismatch {
    fn new(role: Role, is_manager: bool, detail: impl Into<String>) -> Self {
        Self {
            role,
            is_manager,
            detail: detail.into(),
        }
    }
}

fn wire_names<T: Serialize>(items: &[T]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| serde_json::to_value(item).ok())
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

fn compare_case(case: &ParityCase, decision: &PermissionDecision, out: &mut Vec<ParityMismatch>) {
    let mut mismatch = |detail: String| out.push(ParityMismatch::new(case.role, case.is_manager, detail));

    if decision.role != case.role || decision.is_manager != case.is_manager {
        mismatch(format!("decision echoes {}/{}", decision.role, decision.is_manager));
    }

    let tabs = wire_names(&decision.dashboard_tabs);
    if tabs != case.dashboard_tabs {
        mismatch(format!("dashboardTabs {:?}, expected {:?}", tabs, case.dashboard_tabs));
    }

    let groups = wire_names(&decision.sidebar_groups);
    if groups != case.sidebar_groups {
        mismatch(format!("sidebarGroups {:?}, expected {:?}", groups, case.sidebar_groups));
    }

    let flags = decision.permissions;
    let expected = (case.can_view_team, case.can_issue_badges, case.can_manage_users);
    let actual = (flags.can_view_team, flags.can_issue_badges, flags.can_manage_users);
    if actual != expected {
        mismatch(format!("permissions {:?}, expected {:?}", actual, expected));
    }
}

/// Run every canonical case through an engine implementation.
pub fn check_engine<F>(engine: F) -> Result<(), Vec<ParityMismatch>>
where
    F: Fn(Role, bool) -> PermissionDecision,
{
    let mut mismatches = Vec::new();
    for case in CANONICAL_CASES.iter() {
        compare_case(case, &engine(case.role, case.is_manager), &mut mismatches);
    }
    into_result(mismatches)
}

/// Check decisions produced elsewhere (e.g. a client's exported matrix).
///
/// Every canonical case must be covered exactly once.
pub fn check_decisions(decisions: &[PermissionDecision]) -> Result<(), Vec<ParityMismatch>> {
    let mut mismatches = Vec::new();
    for case in CANONICAL_CASES.iter() {
        let found: Vec<&PermissionDecision> = decisions
            .iter()
            .filter(|d| d.role == case.role && d.is_manager == case.is_manager)
            .collect();
        match found.as_slice() {
            [decision] => compare_case(case, decision, &mut mismatches),
            [] => mismatches.push(ParityMismatch::new(case.role, case.is_manager, "case missing")),
            _ => mismatches.push(ParityMismatch::new(case.role, case.is_manager, "case duplicated")),
        }
    }
    into_result(mismatches)
}

/// Check that UI surfaces agree with the routes that serve them.
///
/// A visible tab must always be reachable. A reachable tab must be visible,
/// except where the ADMIN manager bypass opens a manager-only route to an
/// admin without reports.
pub fn check_guard_alignment(routes: &[(DashboardTab, GuardDeclaration)]) -> Result<(), Vec<ParityMismatch>> {
    let mut mismatches = Vec::new();
    for case in CANONICAL_CASES.iter() {
        let decision = compute_permissions(case.role, case.is_manager);
        let claim = IdentityClaim::new(uuid::Uuid::nil(), case.role).with_manager(case.is_manager);

        for (tab, declaration) in routes {
            let visible = decision.has_tab(*tab);
            let allowed = is_allowed(Some(&claim), declaration);
            let admin_bypass = declaration.requires_manager && case.role.is_admin();

            if visible && !allowed {
                mismatches.push(ParityMismatch::new(
                    case.role,
                    case.is_manager,
                    format!("{:?} tab shown but its route denies", tab),
                ));
            } else if !visible && allowed && !admin_bypass {
                mismatches.push(ParityMismatch::new(
                    case.role,
                    case.is_manager,
                    format!("{:?} route allows but the tab is hidden", tab),
                ));
            }
        }
    }
    into_result(mismatches)
}

/// Sidebar groups must mirror dashboard tabs one-to-one.
pub fn check_tab_group_correspondence() -> Result<(), Vec<ParityMismatch>> {
    let mut mismatches = Vec::new();
    for case in CANONICAL_CASES.iter() {
        let decision = compute_permissions(case.role, case.is_manager);
        let mirrored: Vec<SidebarGroup> = decision
            .dashboard_tabs
            .iter()
            .map(|tab| match tab {
                DashboardTab::MyBadges => SidebarGroup::Base,
                DashboardTab::Team => SidebarGroup::Team,
                DashboardTab::Issuance => SidebarGroup::Issuance,
                DashboardTab::Admin => SidebarGroup::Admin,
            })
            .collect();
        if mirrored != decision.sidebar_groups {
            mismatches.push(ParityMismatch::new(case.role, case.is_manager, "tabs and groups diverge"));
        }
    }
    into_result(mismatches)
}

/// The engine's full output, in canonical case order, for out-of-process checks.
pub fn export_matrix() -> Vec<PermissionDecision> {
    CANONICAL_CASES
        .iter()
        .map(|case| compute_permissions(case.role, case.is_manager))
        .collect()
}

fn into_result(mismatches: Vec<ParityMismatch>) -> Result<(), Vec<ParityMismatch>> {
    if mismatches.is_empty() {
        Ok(())
    } else {
        Err(mismatches)
    }
}
