//! Saved chat session endpoints for students and guests.

use crate::data::chat_sessions;
use crate::llm::ChatMessage;
use crate::state::AppState;
use crate::web::auth::extractors::SessionOwnerUser;
use crate::web::error::{ApiError, db_error};
use axum::Json;
use axum::extract::{Path, State};
use serde_json::{Value, json};

/// `POST /api/sessions`
///
/// Snapshots the current conversation under the next "Chat N" name.
pub async fn save(
    State(state): State<AppState>,
    owner: SessionOwnerUser,
) -> Result<Json<Value>, ApiError> {
    let history = state.engine.history(&owner.token);
    if history.is_empty() {
        return Err(ApiError::bad_request("nothing to save yet"));
    }

    let messages = serde_json::to_value(&history)
        .map_err(|_| ApiError::internal_error("failed to serialize transcript"))?;

    let summary = chat_sessions::save(&state.db_pool, &owner.owner, &messages)
        .await
        .map_err(|e| db_error("save chat session", e))?;

    Ok(Json(json!({ "session": summary })))
}

/// `GET /api/sessions`
pub async fn list(
    State(state): State<AppState>,
    owner: SessionOwnerUser,
) -> Result<Json<Value>, ApiError> {
    let sessions = chat_sessions::list(&state.db_pool, &owner.owner)
        .await
        .map_err(|e| db_error("list chat sessions", e))?;
    Ok(Json(json!({ "sessions": sessions })))
}

/// `GET /api/sessions/{id}`
///
/// Returns the transcript and resumes it as the live conversation.
pub async fn load(
    State(state): State<AppState>,
    owner: SessionOwnerUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let (summary, messages) = chat_sessions::load(&state.db_pool, &owner.owner, id)
        .await
        .map_err(|e| db_error("load chat session", e))?
        .ok_or_else(|| ApiError::not_found("session not found"))?;

    // Resume the saved conversation in memory so follow-up questions keep
    // their context.
    if let Ok(history) = serde_json::from_value::<Vec<ChatMessage>>(messages.clone()) {
        state.engine.set_history(&owner.token, history);
    }

    Ok(Json(json!({ "session": summary, "messages": messages })))
}

/// `DELETE /api/sessions/{id}`
pub async fn delete(
    State(state): State<AppState>,
    owner: SessionOwnerUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let deleted = chat_sessions::delete(&state.db_pool, &owner.owner, id)
        .await
        .map_err(|e| db_error("delete chat session", e))?;
    if !deleted {
        return Err(ApiError::not_found("session not found"));
    }
    Ok(Json(json!({ "ok": true })))
}
