use super::principal::IdentityClaim;
use super::role::Role;

/// Static access requirements attached to a protected operation.
///
/// An empty `required_roles` means any authenticated role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardDeclaration {
    pub required_roles: &'static [Role],
    pub requires_manager: bool,
}

impl GuardDeclaration {
    /// Bare authentication: any role, manager status irrelevant.
    pub const fn authenticated() -> Self {
        Self {
            required_roles: &[],
            requires_manager: false,
        }
    }

    pub const fn roles(required_roles: &'static [Role]) -> Self {
        Self {
            required_roles,
            requires_manager: false,
        }
    }

    pub const fn manager() -> Self {
        Self {
            required_roles: &[],
            requires_manager: true,
        }
    }

    pub const fn and_manager(self) -> Self {
        Self {
            required_roles: self.required_roles,
            requires_manager: true,
        }
    }

    pub fn admits_role(&self, role: Role) -> bool {
        self.required_roles.is_empty() || self.required_roles.contains(&role)
    }
}

impl Default for GuardDeclaration {
    fn default() -> Self {
        Self::authenticated()
    }
}

/// Reason an operation was refused. Always surfaced as forbidden, never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Denial {
    #[error("Authentication required")]
    ClaimAbsent,
    #[error("Insufficient role")]
    RoleNotPermitted { role: Role },
    #[error("Manager access required")]
    ManagerRequired,
}

impl Denial {
    pub fn code(&self) -> &'static str {
        match self {
            Denial::ClaimAbsent => "claim_absent",
            Denial::RoleNotPermitted { .. } => "role_not_permitted",
            Denial::ManagerRequired => "manager_required",
        }
    }
}

pub fn role_check(claim: &IdentityClaim, declaration: &GuardDeclaration) -> Result<(), Denial> {
    if declaration.admits_role(claim.role) {
        Ok(())
    } else {
        Err(Denial::RoleNotPermitted { role: claim.role })
    }
}

/// ADMIN passes unconditionally; everyone else needs an explicit `true` claim.
pub fn manager_check(claim: &IdentityClaim, declaration: &GuardDeclaration) -> Result<(), Denial> {
    if !declaration.requires_manager || claim.is_admin() || claim.is_manager() {
        Ok(())
    } else {
        Err(Denial::ManagerRequired)
    }
}

/// Evaluate a declaration against the caller's claim.
///
/// Evaluation order:
/// 1. absent claim -> deny
/// 2. role check -> deny on failure
/// 3. manager check -> deny on failure
/// 4. allow
pub fn can_activate(claim: Option<&IdentityClaim>, declaration: &GuardDeclaration) -> Result<(), Denial> {
    let claim = claim.ok_or(Denial::ClaimAbsent)?;
    role_check(claim, declaration)?;
    manager_check(claim, declaration)
}

pub fn is_allowed(claim: Option<&IdentityClaim>, declaration: &GuardDeclaration) -> bool {
    can_activate(claim, declaration).is_ok()
}
