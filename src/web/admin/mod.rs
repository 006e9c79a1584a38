//! Admin API endpoints. Every handler takes [`AdminUser`] so non-admin
//! sessions are rejected before any work happens.

pub mod datasets;
pub mod feedback;
pub mod history;
pub mod memory;
pub mod qa;

use crate::data;
use crate::state::AppState;
use crate::web::auth::extractors::AdminUser;
use crate::web::error::{ApiError, db_error};
use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

/// `GET /api/admin/dashboard`
///
/// Headline numbers for the admin landing page.
pub async fn dashboard(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Value>, ApiError> {
    let students = data::students::count(&state.db_pool)
        .await
        .map_err(|e| db_error("count students", e))?;
    let questions = data::qa::count(&state.db_pool)
        .await
        .map_err(|e| db_error("count questions", e))?;
    let sessions = data::chat_sessions::count(&state.db_pool)
        .await
        .map_err(|e| db_error("count chat sessions", e))?;
    let corrections = data::memory::count(&state.db_pool)
        .await
        .map_err(|e| db_error("count memory corrections", e))?;
    let feedback = data::feedback::stats(&state.db_pool)
        .await
        .map_err(|e| db_error("feedback stats", e))?;
    let messages = data::usage::count(&state.db_pool)
        .await
        .map_err(|e| db_error("count usage logs", e))?;
    let fallback_rate = data::usage::fallback_rate(&state.db_pool)
        .await
        .map_err(|e| db_error("fallback rate", e))?;

    let index_phrases = state.qa_index.read().await.len();

    Ok(Json(json!({
        "students": students,
        "questions": questions,
        "chatSessions": sessions,
        "memoryCorrections": corrections,
        "feedback": feedback,
        "messagesAnswered": messages,
        "fallbackRate": fallback_rate,
        "indexPhrases": index_phrases,
    })))
}
