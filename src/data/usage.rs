//! Usage log inserts, one row per answered chat message.

use anyhow::{Context, Result};
use sqlx::PgPool;

pub struct UsageEntry<'a> {
    pub user_ref: &'a str,
    pub message: &'a str,
    pub intent: &'a str,
    pub answer_source: &'a str,
    pub fallback: bool,
    pub latency_ms: i32,
    pub reply: &'a str,
}

pub async fn insert(pool: &PgPool, entry: UsageEntry<'_>) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO usage_logs (user_ref, message, intent, answer_source, fallback, latency_ms, reply)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(entry.user_ref)
    .bind(entry.message)
    .bind(entry.intent)
    .bind(entry.answer_source)
    .bind(entry.fallback)
    .bind(entry.latency_ms)
    .bind(entry.reply)
    .execute(pool)
    .await
    .context("failed to insert usage log")?;
    Ok(())
}

pub async fn count(pool: &PgPool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM usage_logs")
        .fetch_one(pool)
        .await
        .context("failed to count usage logs")?;
    Ok(count)
}

/// Share of answered messages that fell through to the static fallback.
pub async fn fallback_rate(pool: &PgPool) -> Result<Option<f64>> {
    let (rate,): (Option<f64>,) = sqlx::query_as(
        "SELECT AVG(fallback::int)::float8 FROM usage_logs",
    )
    .fetch_one(pool)
    .await
    .context("failed to compute fallback rate")?;
    Ok(rate)
}
