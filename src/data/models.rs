//! Row types shared across the data layer and API handlers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Student {
    pub id: i32,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Admin {
    pub id: i32,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A question row joined with its answer and synonyms for admin screens.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QaPair {
    pub id: i32,
    pub question: String,
    pub answer: String,
    pub category: Option<String>,
    pub synonyms: Vec<Synonym>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Synonym {
    pub id: i32,
    pub question_id: i32,
    pub synonym: String,
}

/// Saved chat session header (no message payload).
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSessionSummary {
    pub id: i32,
    pub session_name: String,
    pub created_at: DateTime<Utc>,
}

/// Admin view of a saved session, labeled with its owner.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSessionAdminRow {
    pub id: i32,
    pub session_name: String,
    pub owner_label: String,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: i32,
    pub rating: i32,
    pub comment: Option<String>,
    pub student_id: Option<i32>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryCorrection {
    pub id: i32,
    pub corrected_question: String,
    pub original_answer: Option<String>,
    pub corrected_answer: String,
    pub created_at: DateTime<Utc>,
}

/// An authenticated browser session. Exactly one principal field is set.
#[derive(Debug, Clone, FromRow)]
pub struct AuthSession {
    pub token: String,
    pub student_id: Option<i32>,
    pub admin_id: Option<i32>,
    pub guest_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
