//! Authorization module - Permission Matrix Engine and Guard Layer
//!
//! Two independent dimensions gate every protected operation:
//! - Permission dimension: the caller's [`Role`]
//! - Organization dimension: the `isManager` claim, computed from the
//!   reporting hierarchy at token issuance
//!
//! [`matrix`] derives UI capabilities from the pair; [`guard`] enforces
//! per-route declarations; [`parity`] keeps the two in agreement.

mod guard;
pub mod matrix;
pub mod middleware;
pub mod parity;
mod principal;
mod role;

pub use guard::{can_activate, is_allowed, manager_check, role_check, Denial, GuardDeclaration};
pub use matrix::{
    compute_permissions, compute_permissions_for, DashboardTab, FlatCapabilities, PermissionDecision, SidebarGroup,
    PERMISSION_MATRIX,
};
pub use principal::IdentityClaim;
pub use role::{Role, UnknownRole};
