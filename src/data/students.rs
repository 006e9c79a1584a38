//! Student account queries.

use crate::data::models::Student;
use anyhow::{Context, Result};
use sqlx::PgPool;

/// Insert a new student. Returns `None` when the email is already taken.
pub async fn create(
    pool: &PgPool,
    full_name: &str,
    email: &str,
    password_hash: &str,
) -> Result<Option<Student>> {
    let row = sqlx::query_as::<_, Student>(
        r#"
        INSERT INTO students (full_name, email, password_hash)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO NOTHING
        RETURNING id, full_name, email, password_hash, created_at
        "#,
    )
    .bind(full_name)
    .bind(email)
    .bind(password_hash)
    .fetch_optional(pool)
    .await
    .context("failed to insert student")?;
    Ok(row)
}

pub async fn count(pool: &PgPool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM students")
        .fetch_one(pool)
        .await
        .context("failed to count students")?;
    Ok(count)
}

pub async fn get_by_email(pool: &PgPool, email: &str) -> Result<Option<Student>> {
    let row = sqlx::query_as::<_, Student>(
        "SELECT id, full_name, email, password_hash, created_at FROM students WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("failed to fetch student by email")?;
    Ok(row)
}

pub async fn get_by_id(pool: &PgPool, id: i32) -> Result<Option<Student>> {
    let row = sqlx::query_as::<_, Student>(
        "SELECT id, full_name, email, password_hash, created_at FROM students WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("failed to fetch student by id")?;
    Ok(row)
}
