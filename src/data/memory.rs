//! Memory corrections: answers taught to the bot at chat time.
//!
//! Corrections take priority over every other answer source, so a user
//! who fixed a wrong reply sees the fix immediately on the next ask.

use crate::data::models::MemoryCorrection;
use anyhow::{Context, Result};
use sqlx::PgPool;

/// Find a correction whose question appears inside the incoming message,
/// case-insensitively. Newest corrections win when several match.
///
/// `strpos` keeps `%` and `_` in stored questions literal, unlike LIKE.
pub async fn find_correction(pool: &PgPool, input: &str) -> Result<Option<String>> {
    let row: Option<(String,)> = sqlx::query_as(
        r#"
        SELECT corrected_answer FROM memory_corrections
        WHERE strpos(lower($1), lower(corrected_question)) > 0
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(input)
    .fetch_optional(pool)
    .await
    .context("failed to look up memory correction")?;
    Ok(row.map(|(answer,)| answer))
}

pub async fn insert(
    pool: &PgPool,
    corrected_question: &str,
    original_answer: Option<&str>,
    corrected_answer: &str,
) -> Result<MemoryCorrection> {
    let row = sqlx::query_as::<_, MemoryCorrection>(
        r#"
        INSERT INTO memory_corrections (corrected_question, original_answer, corrected_answer)
        VALUES ($1, $2, $3)
        RETURNING id, corrected_question, original_answer, corrected_answer, created_at
        "#,
    )
    .bind(corrected_question)
    .bind(original_answer)
    .bind(corrected_answer)
    .fetch_one(pool)
    .await
    .context("failed to insert memory correction")?;
    Ok(row)
}

pub async fn list(pool: &PgPool) -> Result<Vec<MemoryCorrection>> {
    let rows = sqlx::query_as::<_, MemoryCorrection>(
        r#"
        SELECT id, corrected_question, original_answer, corrected_answer, created_at
        FROM memory_corrections
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await
    .context("failed to list memory corrections")?;
    Ok(rows)
}

pub async fn update(
    pool: &PgPool,
    id: i32,
    corrected_question: &str,
    corrected_answer: &str,
) -> Result<bool> {
    let affected = sqlx::query(
        "UPDATE memory_corrections SET corrected_question = $2, corrected_answer = $3 WHERE id = $1",
    )
    .bind(id)
    .bind(corrected_question)
    .bind(corrected_answer)
    .execute(pool)
    .await
    .context("failed to update memory correction")?
    .rows_affected();
    Ok(affected > 0)
}

pub async fn delete(pool: &PgPool, id: i32) -> Result<bool> {
    let affected = sqlx::query("DELETE FROM memory_corrections WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("failed to delete memory correction")?
        .rows_affected();
    Ok(affected > 0)
}

pub async fn count(pool: &PgPool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM memory_corrections")
        .fetch_one(pool)
        .await
        .context("failed to count memory corrections")?;
    Ok(count)
}
