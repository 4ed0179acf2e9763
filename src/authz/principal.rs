use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::Role;
use crate::errors::AppError;

/// Authenticated caller as stated by the session token.
///
/// `is_manager` is `None` for tokens minted before the claim existed; the
/// guard treats that exactly like `Some(false)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityClaim {
    pub user_id: Uuid,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_manager: Option<bool>,
}

impl IdentityClaim {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self {
            user_id,
            role,
            is_manager: Some(false),
        }
    }

    pub fn with_manager(mut self, is_manager: bool) -> Self {
        self.is_manager = Some(is_manager);
        self
    }

    pub fn without_manager_claim(mut self) -> Self {
        self.is_manager = None;
        self
    }

    /// Strict reading of the organizational flag: only an explicit `true` counts.
    pub fn is_manager(&self) -> bool {
        self.is_manager == Some(true)
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Handlers behind the `authenticate` layer pull the claim it attached.
#[async_trait]
impl<S> FromRequestParts<S> for IdentityClaim
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<IdentityClaim>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("Authentication required"))
    }
}
