//! Reporting-hierarchy lookups.
//!
//! Consulted only when a token is issued or refreshed; the resulting flag
//! rides in the token as the `isManager` claim.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::errors::AppResult;

#[async_trait]
pub trait ReportingHierarchy: Send + Sync {
    /// True when at least one other active user reports to `user_id`.
    async fn has_direct_reports(&self, user_id: Uuid) -> AppResult<bool>;
}

#[derive(Debug, Clone)]
pub struct SqliteHierarchy {
    pool: SqlitePool,
}

impl SqliteHierarchy {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportingHierarchy for SqliteHierarchy {
    async fn has_direct_reports(&self, user_id: Uuid) -> AppResult<bool> {
        let id = user_id.to_string();
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE manager_id = ? AND id != ? AND is_active = 1)",
        )
        .bind(&id)
        .bind(&id)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(user_id = %user_id, is_manager = exists, "computed manager flag");
        Ok(exists)
    }
}
