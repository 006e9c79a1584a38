//! Q&A corpus queries: questions, answers, and synonyms.
//!
//! Every question has exactly one answer row; synonyms are alternate
//! phrasings that match back to the same answer.

use crate::data::models::{QaPair, Synonym};
use anyhow::{Context, Result};
use sqlx::PgPool;
use std::collections::HashMap;

/// Fetch all Q&A pairs with their synonyms, newest first.
pub async fn list(pool: &PgPool) -> Result<Vec<QaPair>> {
    let mut pairs = fetch_pairs(pool, None).await?;

    let synonyms = sqlx::query_as::<_, Synonym>(
        "SELECT id, question_id, synonym FROM synonyms ORDER BY id",
    )
    .fetch_all(pool)
    .await
    .context("failed to fetch synonyms")?;

    let mut by_question: HashMap<i32, Vec<Synonym>> = HashMap::new();
    for synonym in synonyms {
        by_question.entry(synonym.question_id).or_default().push(synonym);
    }
    for pair in &mut pairs {
        if let Some(list) = by_question.remove(&pair.id) {
            pair.synonyms = list;
        }
    }

    Ok(pairs)
}

/// Fetch one Q&A pair with its synonyms.
pub async fn get(pool: &PgPool, id: i32) -> Result<Option<QaPair>> {
    let mut pairs = fetch_pairs(pool, Some(id)).await?;
    let Some(mut pair) = pairs.pop() else {
        return Ok(None);
    };

    pair.synonyms = sqlx::query_as::<_, Synonym>(
        "SELECT id, question_id, synonym FROM synonyms WHERE question_id = $1 ORDER BY id",
    )
    .bind(id)
    .fetch_all(pool)
    .await
    .context("failed to fetch synonyms for question")?;

    Ok(Some(pair))
}

async fn fetch_pairs(pool: &PgPool, id: Option<i32>) -> Result<Vec<QaPair>> {
    #[derive(sqlx::FromRow)]
    struct Row {
        id: i32,
        question: String,
        answer: String,
        category: Option<String>,
        created_at: chrono::DateTime<chrono::Utc>,
        updated_at: chrono::DateTime<chrono::Utc>,
    }

    let rows = sqlx::query_as::<_, Row>(
        r#"
        SELECT q.id, q.question, a.answer, q.category, q.created_at, q.updated_at
        FROM questions q
        JOIN answers a ON a.question_id = q.id
        WHERE ($1::int IS NULL OR q.id = $1)
        ORDER BY q.created_at DESC
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await
    .context("failed to fetch Q&A pairs")?;

    Ok(rows
        .into_iter()
        .map(|r| QaPair {
            id: r.id,
            question: r.question,
            answer: r.answer,
            category: r.category,
            synonyms: Vec::new(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
        .collect())
}

/// Insert a question with its answer. Runs in a transaction so a failed
/// answer insert never leaves an orphaned question.
pub async fn create(
    pool: &PgPool,
    question: &str,
    answer: &str,
    category: Option<&str>,
) -> Result<i32> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let (question_id,): (i32,) = sqlx::query_as(
        "INSERT INTO questions (question, category) VALUES ($1, $2) RETURNING id",
    )
    .bind(question)
    .bind(category)
    .fetch_one(&mut *tx)
    .await
    .context("failed to insert question")?;

    sqlx::query("INSERT INTO answers (question_id, answer) VALUES ($1, $2)")
        .bind(question_id)
        .bind(answer)
        .execute(&mut *tx)
        .await
        .context("failed to insert answer")?;

    tx.commit().await.context("failed to commit Q&A insert")?;
    Ok(question_id)
}

/// Update a question and its answer. Returns false when the id is unknown.
pub async fn update(
    pool: &PgPool,
    id: i32,
    question: &str,
    answer: &str,
    category: Option<&str>,
) -> Result<bool> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let updated = sqlx::query(
        "UPDATE questions SET question = $2, category = $3, updated_at = now() WHERE id = $1",
    )
    .bind(id)
    .bind(question)
    .bind(category)
    .execute(&mut *tx)
    .await
    .context("failed to update question")?
    .rows_affected();

    if updated == 0 {
        tx.rollback().await.ok();
        return Ok(false);
    }

    sqlx::query("UPDATE answers SET answer = $2, updated_at = now() WHERE question_id = $1")
        .bind(id)
        .bind(answer)
        .execute(&mut *tx)
        .await
        .context("failed to update answer")?;

    tx.commit().await.context("failed to commit Q&A update")?;
    Ok(true)
}

/// Delete a question; answers and synonyms go with it via cascade.
pub async fn delete(pool: &PgPool, id: i32) -> Result<bool> {
    let affected = sqlx::query("DELETE FROM questions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("failed to delete question")?
        .rows_affected();
    Ok(affected > 0)
}

/// Attach a synonym to a question. `None` when the question doesn't exist.
pub async fn add_synonym(pool: &PgPool, question_id: i32, synonym: &str) -> Result<Option<Synonym>> {
    let row = sqlx::query_as::<_, Synonym>(
        r#"
        INSERT INTO synonyms (question_id, synonym)
        SELECT q.id, $2 FROM questions q WHERE q.id = $1
        RETURNING id, question_id, synonym
        "#,
    )
    .bind(question_id)
    .bind(synonym)
    .fetch_optional(pool)
    .await
    .context("failed to insert synonym")?;
    Ok(row)
}

pub async fn delete_synonym(pool: &PgPool, id: i32) -> Result<bool> {
    let affected = sqlx::query("DELETE FROM synonyms WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("failed to delete synonym")?
        .rows_affected();
    Ok(affected > 0)
}

/// The stored answer for a matched question.
pub async fn get_answer(pool: &PgPool, question_id: i32) -> Result<Option<String>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT answer FROM answers WHERE question_id = $1")
            .bind(question_id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch answer")?;
    Ok(row.map(|(answer,)| answer))
}

/// All phrases for the match index: every question plus every synonym,
/// each tagged with the question id that owns the answer.
pub async fn match_rows(pool: &PgPool) -> Result<Vec<(i32, String)>> {
    let rows: Vec<(i32, String)> = sqlx::query_as(
        r#"
        SELECT id, question FROM questions
        UNION ALL
        SELECT question_id, synonym FROM synonyms
        "#,
    )
    .fetch_all(pool)
    .await
    .context("failed to fetch match rows")?;
    Ok(rows)
}

pub async fn count(pool: &PgPool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM questions")
        .fetch_one(pool)
        .await
        .context("failed to count questions")?;
    Ok(count)
}
