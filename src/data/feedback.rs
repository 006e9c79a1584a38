//! User feedback queries.

use crate::data::models::Feedback;
use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::PgPool;

/// Aggregate numbers for the admin dashboard.
#[derive(Debug, Clone, Copy, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackStats {
    pub total: i64,
    pub average_rating: Option<f64>,
}

pub async fn insert(
    pool: &PgPool,
    rating: i32,
    comment: Option<&str>,
    student_id: Option<i32>,
) -> Result<Feedback> {
    let row = sqlx::query_as::<_, Feedback>(
        r#"
        INSERT INTO feedback (rating, comment, student_id)
        VALUES ($1, $2, $3)
        RETURNING id, rating, comment, student_id, submitted_at
        "#,
    )
    .bind(rating)
    .bind(comment)
    .bind(student_id)
    .fetch_one(pool)
    .await
    .context("failed to insert feedback")?;
    Ok(row)
}

pub async fn list(pool: &PgPool) -> Result<Vec<Feedback>> {
    let rows = sqlx::query_as::<_, Feedback>(
        "SELECT id, rating, comment, student_id, submitted_at FROM feedback ORDER BY submitted_at DESC",
    )
    .fetch_all(pool)
    .await
    .context("failed to list feedback")?;
    Ok(rows)
}

pub async fn stats(pool: &PgPool) -> Result<FeedbackStats> {
    let row = sqlx::query_as::<_, FeedbackStats>(
        "SELECT COUNT(*) AS total, AVG(rating)::float8 AS average_rating FROM feedback",
    )
    .fetch_one(pool)
    .await
    .context("failed to aggregate feedback")?;
    Ok(row)
}
