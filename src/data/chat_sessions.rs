//! Saved chat sessions.
//!
//! A session snapshot belongs to exactly one owner, either a signed-in
//! student or a guest id. Owner-scoped queries never leak another
//! owner's sessions; the admin views see everything.

use crate::data::models::{ChatSessionAdminRow, ChatSessionSummary};
use anyhow::{Context, Result};
use serde_json::Value;
use sqlx::PgPool;
use sqlx::types::Json;

/// The principal a saved session belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOwner {
    Student(i32),
    Guest(String),
}

impl SessionOwner {
    fn student_id(&self) -> Option<i32> {
        match self {
            SessionOwner::Student(id) => Some(*id),
            SessionOwner::Guest(_) => None,
        }
    }

    fn guest_id(&self) -> Option<&str> {
        match self {
            SessionOwner::Student(_) => None,
            SessionOwner::Guest(id) => Some(id.as_str()),
        }
    }

    fn user_type(&self) -> &'static str {
        match self {
            SessionOwner::Student(_) => "student",
            SessionOwner::Guest(_) => "guest",
        }
    }
}

/// Save a transcript under the next free "Chat N" name for this owner.
pub async fn save(
    pool: &PgPool,
    owner: &SessionOwner,
    messages: &Value,
) -> Result<ChatSessionSummary> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let (existing,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM chat_sessions
        WHERE ($1::int IS NOT NULL AND student_id = $1)
           OR ($2::text IS NOT NULL AND guest_id = $2)
        "#,
    )
    .bind(owner.student_id())
    .bind(owner.guest_id())
    .fetch_one(&mut *tx)
    .await
    .context("failed to count existing sessions")?;

    let session_name = format!("Chat {}", existing + 1);

    let summary = sqlx::query_as::<_, ChatSessionSummary>(
        r#"
        INSERT INTO chat_sessions (session_name, messages, student_id, guest_id, user_type)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, session_name, created_at
        "#,
    )
    .bind(&session_name)
    .bind(Json(messages))
    .bind(owner.student_id())
    .bind(owner.guest_id())
    .bind(owner.user_type())
    .fetch_one(&mut *tx)
    .await
    .context("failed to insert chat session")?;

    tx.commit().await.context("failed to commit chat session")?;
    Ok(summary)
}

/// List this owner's saved sessions, newest first.
pub async fn list(pool: &PgPool, owner: &SessionOwner) -> Result<Vec<ChatSessionSummary>> {
    let rows = sqlx::query_as::<_, ChatSessionSummary>(
        r#"
        SELECT id, session_name, created_at FROM chat_sessions
        WHERE (($1::int IS NOT NULL AND student_id = $1)
            OR ($2::text IS NOT NULL AND guest_id = $2))
        ORDER BY created_at DESC
        "#,
    )
    .bind(owner.student_id())
    .bind(owner.guest_id())
    .fetch_all(pool)
    .await
    .context("failed to list chat sessions")?;
    Ok(rows)
}

/// Load one of this owner's sessions. `None` when the id is unknown or
/// belongs to someone else.
pub async fn load(
    pool: &PgPool,
    owner: &SessionOwner,
    id: i32,
) -> Result<Option<(ChatSessionSummary, Value)>> {
    let row: Option<(i32, String, chrono::DateTime<chrono::Utc>, Json<Value>)> = sqlx::query_as(
        r#"
        SELECT id, session_name, created_at, messages FROM chat_sessions
        WHERE id = $1
          AND (($2::int IS NOT NULL AND student_id = $2)
            OR ($3::text IS NOT NULL AND guest_id = $3))
        "#,
    )
    .bind(id)
    .bind(owner.student_id())
    .bind(owner.guest_id())
    .fetch_optional(pool)
    .await
    .context("failed to load chat session")?;

    Ok(row.map(|(id, session_name, created_at, Json(messages))| {
        (
            ChatSessionSummary {
                id,
                session_name,
                created_at,
            },
            messages,
        )
    }))
}

/// Delete one of this owner's sessions.
pub async fn delete(pool: &PgPool, owner: &SessionOwner, id: i32) -> Result<bool> {
    let affected = sqlx::query(
        r#"
        DELETE FROM chat_sessions
        WHERE id = $1
          AND (($2::int IS NOT NULL AND student_id = $2)
            OR ($3::text IS NOT NULL AND guest_id = $3))
        "#,
    )
    .bind(id)
    .bind(owner.student_id())
    .bind(owner.guest_id())
    .execute(pool)
    .await
    .context("failed to delete chat session")?
    .rows_affected();
    Ok(affected > 0)
}

/// Admin listing across all owners. Students show by name, guests by id.
pub async fn admin_list(pool: &PgPool, include_archived: bool) -> Result<Vec<ChatSessionAdminRow>> {
    let rows = sqlx::query_as::<_, ChatSessionAdminRow>(
        r#"
        SELECT cs.id,
               cs.session_name,
               COALESCE(s.full_name, 'Guest ' || cs.guest_id) AS owner_label,
               cs.is_archived,
               cs.created_at
        FROM chat_sessions cs
        LEFT JOIN students s ON s.id = cs.student_id
        WHERE $1 OR NOT cs.is_archived
        ORDER BY cs.created_at DESC
        "#,
    )
    .bind(include_archived)
    .fetch_all(pool)
    .await
    .context("failed to list chat sessions for admin")?;
    Ok(rows)
}

/// Admin view of a single session, transcript included.
pub async fn admin_get(
    pool: &PgPool,
    id: i32,
) -> Result<Option<(ChatSessionAdminRow, Value)>> {
    let row: Option<(
        i32,
        String,
        String,
        bool,
        chrono::DateTime<chrono::Utc>,
        Json<Value>,
    )> = sqlx::query_as(
        r#"
        SELECT cs.id,
               cs.session_name,
               COALESCE(s.full_name, 'Guest ' || cs.guest_id) AS owner_label,
               cs.is_archived,
               cs.created_at,
               cs.messages
        FROM chat_sessions cs
        LEFT JOIN students s ON s.id = cs.student_id
        WHERE cs.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("failed to fetch chat session for admin")?;

    Ok(row.map(
        |(id, session_name, owner_label, is_archived, created_at, Json(messages))| {
            (
                ChatSessionAdminRow {
                    id,
                    session_name,
                    owner_label,
                    is_archived,
                    created_at,
                },
                messages,
            )
        },
    ))
}

pub async fn set_archived(pool: &PgPool, id: i32, archived: bool) -> Result<bool> {
    let affected = sqlx::query("UPDATE chat_sessions SET is_archived = $2 WHERE id = $1")
        .bind(id)
        .bind(archived)
        .execute(pool)
        .await
        .context("failed to update archive flag")?
        .rows_affected();
    Ok(affected > 0)
}

pub async fn count(pool: &PgPool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chat_sessions")
        .fetch_one(pool)
        .await
        .context("failed to count chat sessions")?;
    Ok(count)
}
