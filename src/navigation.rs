//! Sidebar navigation derived from a permission decision.
//!
//! Advisory only: hiding an item is a convenience for the client, the
//! server-side guard is what actually refuses access.

use serde::Serialize;
use utoipa::ToSchema;

use crate::authz::{PermissionDecision, SidebarGroup};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct NavItem {
    pub label: &'static str,
    pub href: &'static str,
    #[serde(skip)]
    pub group: SidebarGroup,
}

const fn item(label: &'static str, href: &'static str, group: SidebarGroup) -> NavItem {
    NavItem { label, href, group }
}

/// Every user-facing route with its sidebar group.
///
/// `/admin/badges` is listed under both team and issuance.
pub const NAVIGATION_ITEMS: [NavItem; 11] = [
    item("Dashboard", "/", SidebarGroup::Base),
    item("Wallet", "/wallet", SidebarGroup::Base),
    item("Team Overview", "/admin/badges", SidebarGroup::Team),
    item("Templates", "/admin/templates", SidebarGroup::Issuance),
    item("Badges", "/admin/badges", SidebarGroup::Issuance),
    item("Bulk Issue", "/admin/bulk-issuance", SidebarGroup::Issuance),
    item("Analytics", "/admin/analytics", SidebarGroup::Issuance),
    item("Users", "/admin/users", SidebarGroup::Admin),
    item("Categories", "/admin/skills/categories", SidebarGroup::Admin),
    item("Skills", "/admin/skills", SidebarGroup::Admin),
    item("Milestones", "/admin/milestones", SidebarGroup::Admin),
];

/// Header shown above a group; the base group has none.
pub fn group_label(group: SidebarGroup) -> &'static str {
    match group {
        SidebarGroup::Base => "",
        SidebarGroup::Team => "Team",
        SidebarGroup::Issuance => "Issuance",
        SidebarGroup::Admin => "Admin",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct NavSection {
    pub group: SidebarGroup,
    pub label: &'static str,
    pub items: Vec<NavItem>,
}

/// Sections in the decision's group order, each with its items in config order.
pub fn visible_sections(decision: &PermissionDecision) -> Vec<NavSection> {
    decision
        .sidebar_groups
        .iter()
        .map(|&group| NavSection {
            group,
            label: group_label(group),
            items: NAVIGATION_ITEMS.iter().copied().filter(|i| i.group == group).collect(),
        })
        .collect()
}
