//! Denial audit trail.
//!
//! The guard itself never writes audit records. The `authorize` middleware,
//! as the caller, publishes a [`DenialEvent`] here; a background listener
//! persists events into `access_denials` as a SHA-256 hash chain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::{SqliteConnection, SqlitePool};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::authz::{Denial, IdentityClaim, Role};
use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenialEvent {
    pub id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub user_id: Option<Uuid>,
    pub role: Option<Role>,
    pub method: String,
    pub path: String,
    pub code: String,
    pub reason: String,
}

impl DenialEvent {
    pub fn new(claim: Option<&IdentityClaim>, method: &str, path: &str, denial: &Denial) -> Self {
        Self {
            id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            user_id: claim.map(|c| c.user_id),
            role: claim.map(|c| c.role),
            method: method.to_string(),
            path: path.to_string(),
            code: denial.code().to_string(),
            reason: denial.to_string(),
        }
    }
}

pub type AuditBus = broadcast::Sender<DenialEvent>;

pub fn init_audit_bus() -> (AuditBus, broadcast::Receiver<DenialEvent>) {
    broadcast::channel(1024)
}

/// Fire and forget; a missing listener must not affect the response.
pub fn record_denial(bus: &AuditBus, event: DenialEvent) {
    let _ = bus.send(event);
}

pub fn chain_hash(prev_hash: Option<&str>, payload: &str) -> String {
    let mut hasher = Sha256::new();
    if let Some(prev) = prev_hash {
        hasher.update(prev.as_bytes());
    }
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

/// Append one event to the chain.
///
/// The head lookup and the insert run under `BEGIN IMMEDIATE`, so concurrent
/// writers (other listeners, other processes on the same file) queue on the
/// SQLite write lock instead of linking to the same head.
pub async fn persist_denial(pool: &SqlitePool, event: &DenialEvent) -> AppResult<()> {
    let payload = serde_json::to_string(event)
        .map_err(|err| AppError::internal(format!("failed to serialize denial event: {err}")))?;

    let mut conn = pool.acquire().await?;
    sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

    match append_link(&mut *conn, event, &payload).await {
        Ok(()) => {
            sqlx::query("COMMIT").execute(&mut *conn).await?;
            Ok(())
        }
        Err(err) => {
            if let Err(rollback) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                tracing::warn!(error = %rollback, "failed to roll back denial audit insert");
            }
            Err(err)
        }
    }
}

async fn append_link(conn: &mut SqliteConnection, event: &DenialEvent, payload: &str) -> AppResult<()> {
    let prev_hash: Option<String> =
        sqlx::query_scalar("SELECT hash FROM access_denials ORDER BY seq DESC LIMIT 1")
            .fetch_optional(&mut *conn)
            .await?;
    let hash = chain_hash(prev_hash.as_deref(), payload);

    sqlx::query(
        r#"
        INSERT INTO access_denials (id, occurred_at, user_id, role, method, path, code, reason, payload, prev_hash, hash)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(event.id.to_string())
    .bind(event.occurred_at)
    .bind(event.user_id.map(|u| u.to_string()))
    .bind(event.role.map(|r| r.as_str()))
    .bind(&event.method)
    .bind(&event.path)
    .bind(&event.code)
    .bind(&event.reason)
    .bind(payload)
    .bind(&prev_hash)
    .bind(&hash)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn start_denial_listener(mut rx: broadcast::Receiver<DenialEvent>, pool: SqlitePool) {
    tracing::info!("Denial audit listener started");
    loop {
        match rx.recv().await {
            Ok(event) => {
                if let Err(e) = persist_denial(&pool, &event).await {
                    tracing::error!("Failed to save denial audit record: {}", e);
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "denial audit listener lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
