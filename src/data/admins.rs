//! Admin account queries.

use crate::data::models::Admin;
use anyhow::{Context, Result};
use sqlx::PgPool;

pub async fn get_by_email(pool: &PgPool, email: &str) -> Result<Option<Admin>> {
    let row = sqlx::query_as::<_, Admin>(
        "SELECT id, full_name, email, password_hash, created_at FROM admins WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("failed to fetch admin by email")?;
    Ok(row)
}

pub async fn get_by_id(pool: &PgPool, id: i32) -> Result<Option<Admin>> {
    let row = sqlx::query_as::<_, Admin>(
        "SELECT id, full_name, email, password_hash, created_at FROM admins WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("failed to fetch admin by id")?;
    Ok(row)
}

/// Ensure the configured seed admin exists. The password hash is only applied
/// on first creation; an existing row is left untouched.
pub async fn ensure_seed_admin(
    pool: &PgPool,
    full_name: &str,
    email: &str,
    password_hash: &str,
) -> Result<Admin> {
    let row = sqlx::query_as::<_, Admin>(
        r#"
        INSERT INTO admins (full_name, email, password_hash)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
        RETURNING id, full_name, email, password_hash, created_at
        "#,
    )
    .bind(full_name)
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await
    .context("failed to ensure seed admin")?;
    Ok(row)
}
