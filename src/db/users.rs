use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::authz::Role;
use crate::errors::{AppError, AppResult};
use crate::models::user::{DbUser, NewUser};
use crate::utils::{hash_password, utc_now};

const USER_COLUMNS: &str = "id, email, password_hash, role, manager_id, is_active, created_at, updated_at";

fn parse_uuid(column: &str, raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|err| AppError::internal(format!("invalid uuid in users.{column}: {err}")))
}

fn user_from_row(row: &SqliteRow) -> AppResult<DbUser> {
    let id: String = row.try_get("id")?;
    let manager_id: Option<String> = row.try_get("manager_id")?;
    let role: String = row.try_get("role")?;

    // A stored role outside the enum means the store itself is misconfigured.
    let role = role.parse::<Role>().map_err(|err| {
        tracing::error!(user_id = %id, role = %err.0, "stored role outside the closed enum");
        AppError::configuration(err.to_string())
    })?;

    Ok(DbUser {
        id: parse_uuid("id", &id)?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role,
        manager_id: manager_id.as_deref().map(|m| parse_uuid("manager_id", m)).transpose()?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

pub async fn insert_user(pool: &SqlitePool, new_user: NewUser) -> AppResult<DbUser> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM users WHERE email = ?")
        .bind(&new_user.email)
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Err(AppError::conflict("email already in use"));
    }

    let password_hash = hash_password(&new_user.password)?;
    let now = utc_now();
    let id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO users (id, email, password_hash, role, manager_id, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(id.to_string())
    .bind(&new_user.email)
    .bind(&password_hash)
    .bind(new_user.role.as_str())
    .bind(new_user.manager_id.map(|m| m.to_string()))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(DbUser {
        id,
        email: new_user.email,
        password_hash,
        role: new_user.role,
        manager_id: new_user.manager_id,
        is_active: true,
        created_at: now,
        updated_at: now,
    })
}

pub async fn find_active_by_email(pool: &SqlitePool, email: &str) -> AppResult<Option<DbUser>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ? AND is_active = 1");
    let row = sqlx::query(&sql).bind(email).fetch_optional(pool).await?;
    row.as_ref().map(user_from_row).transpose()
}

pub async fn find_active_by_id(pool: &SqlitePool, user_id: Uuid) -> AppResult<Option<DbUser>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ? AND is_active = 1");
    let row = sqlx::query(&sql).bind(user_id.to_string()).fetch_optional(pool).await?;
    row.as_ref().map(user_from_row).transpose()
}

pub async fn set_active(pool: &SqlitePool, user_id: Uuid, active: bool) -> AppResult<()> {
    sqlx::query("UPDATE users SET is_active = ?, updated_at = ? WHERE id = ?")
        .bind(active)
        .bind(utc_now())
        .bind(user_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_manager(pool: &SqlitePool, user_id: Uuid, manager_id: Option<Uuid>) -> AppResult<()> {
    sqlx::query("UPDATE users SET manager_id = ?, updated_at = ? WHERE id = ?")
        .bind(manager_id.map(|m| m.to_string()))
        .bind(utc_now())
        .bind(user_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}
