use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Permission dimension of the identity model.
///
/// The set is closed: role values come from the claim-issuance process, so
/// anything else reaching the core is a configuration fault upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Issuer,
    Manager,
    Employee,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Employee, Role::Issuer, Role::Admin, Role::Manager];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Issuer => "ISSUER",
            Role::Manager => "MANAGER",
            Role::Employee => "EMPLOYEE",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Position of this role's row pair in the permission matrix.
    pub(crate) const fn matrix_slot(self) -> usize {
        match self {
            Role::Employee => 0,
            Role::Issuer => 1,
            Role::Admin => 2,
            Role::Manager => 3,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ADMIN" => Ok(Role::Admin),
            "ISSUER" => Ok(Role::Issuer),
            "MANAGER" => Ok(Role::Manager),
            "EMPLOYEE" => Ok(Role::Employee),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}
