use badge_gate::authz::{compute_permissions_for, DashboardTab, SidebarGroup};
use badge_gate::errors::AppError;
use badge_gate::{compute_permissions, Role};
use serde_json::json;

#[test]
fn issuer_manager_gets_team_and_issuance() {
    let decision = compute_permissions(Role::Issuer, true);
    assert_eq!(
        decision.dashboard_tabs,
        vec![DashboardTab::MyBadges, DashboardTab::Team, DashboardTab::Issuance]
    );
    assert_eq!(
        decision.sidebar_groups,
        vec![SidebarGroup::Base, SidebarGroup::Team, SidebarGroup::Issuance]
    );
    assert!(decision.permissions.can_view_team);
    assert!(decision.permissions.can_issue_badges);
    assert!(!decision.permissions.can_manage_users);
}

#[test]
fn plain_employee_only_sees_the_floor() {
    let decision = compute_permissions(Role::Employee, false);
    assert_eq!(decision.dashboard_tabs, vec![DashboardTab::MyBadges]);
    assert_eq!(decision.sidebar_groups, vec![SidebarGroup::Base]);
    assert!(!decision.permissions.can_view_team);
    assert!(!decision.permissions.can_issue_badges);
    assert!(!decision.permissions.can_manage_users);
}

#[test]
fn admin_without_reports_has_no_team_tab() {
    let decision = compute_permissions(Role::Admin, false);
    assert!(!decision.has_tab(DashboardTab::Team));
    assert!(decision.has_tab(DashboardTab::Admin));
    assert!(decision.permissions.can_manage_users);
}

#[test]
fn every_combination_keeps_the_floor_and_fixed_order() {
    let order = [
        DashboardTab::MyBadges,
        DashboardTab::Team,
        DashboardTab::Issuance,
        DashboardTab::Admin,
    ];

    for role in Role::ALL {
        for is_manager in [false, true] {
            let decision = compute_permissions(role, is_manager);
            assert_eq!(decision.dashboard_tabs.first(), Some(&DashboardTab::MyBadges));
            assert_eq!(decision.sidebar_groups.first(), Some(&SidebarGroup::Base));

            let positions: Vec<usize> = decision
                .dashboard_tabs
                .iter()
                .filter_map(|tab| order.iter().position(|o| o == tab))
                .collect();
            assert!(positions.windows(2).all(|w| w[0] < w[1]), "{role}/{is_manager} out of order");
        }
    }
}

#[test]
fn the_two_dimensions_are_independent() {
    for role in Role::ALL {
        let without = compute_permissions(role, false);
        let with = compute_permissions(role, true);

        // isManager only ever adds the team surface.
        assert!(!without.permissions.can_view_team);
        assert!(with.permissions.can_view_team);
        assert_eq!(without.permissions.can_issue_badges, with.permissions.can_issue_badges);
        assert_eq!(without.permissions.can_manage_users, with.permissions.can_manage_users);

        let mut expected = without.dashboard_tabs.clone();
        expected.insert(1, DashboardTab::Team);
        assert_eq!(with.dashboard_tabs, expected);
    }
}

#[test]
fn capabilities_follow_the_role_alone() {
    let issuing: Vec<Role> = Role::ALL
        .into_iter()
        .filter(|r| compute_permissions(*r, false).permissions.can_issue_badges)
        .collect();
    assert_eq!(issuing.len(), 2);
    assert!(issuing.contains(&Role::Issuer) && issuing.contains(&Role::Admin));

    let managing: Vec<Role> = Role::ALL
        .into_iter()
        .filter(|r| compute_permissions(*r, true).permissions.can_manage_users)
        .collect();
    assert_eq!(managing, vec![Role::Admin]);
}

#[test]
fn same_input_same_output() {
    for role in Role::ALL {
        for is_manager in [false, true] {
            assert_eq!(compute_permissions(role, is_manager), compute_permissions(role, is_manager));
        }
    }
}

#[test]
fn unknown_role_string_is_a_configuration_error() {
    assert!(matches!(
        compute_permissions_for("SUPERUSER", false),
        Err(AppError::Configuration(_))
    ));
    assert!(matches!(compute_permissions_for("issuer", false), Err(AppError::Configuration(_))));

    let decision = compute_permissions_for("ISSUER", true).unwrap();
    assert_eq!(decision, compute_permissions(Role::Issuer, true));
}

#[test]
fn decision_serializes_in_wire_form() {
    let value = serde_json::to_value(compute_permissions(Role::Employee, true)).unwrap();
    assert_eq!(
        value,
        json!({
            "role": "EMPLOYEE",
            "isManager": true,
            "dashboardTabs": ["my-badges", "team"],
            "sidebarGroups": ["base", "team"],
            "permissions": {"canViewTeam": true, "canIssueBadges": false, "canManageUsers": false}
        })
    );
}
