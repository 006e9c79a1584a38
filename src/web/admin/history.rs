//! Admin chat history review, with soft archive.

use crate::data::chat_sessions;
use crate::state::AppState;
use crate::web::auth::extractors::AdminUser;
use crate::web::error::{ApiError, db_error};
use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryParams {
    #[serde(default)]
    pub include_archived: bool,
}

/// `GET /api/admin/chat-history`
pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Value>, ApiError> {
    let sessions = chat_sessions::admin_list(&state.db_pool, params.include_archived)
        .await
        .map_err(|e| db_error("list chat history", e))?;
    Ok(Json(json!({ "sessions": sessions })))
}

/// `GET /api/admin/chat-history/{id}`
pub async fn get(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let (session, messages) = chat_sessions::admin_get(&state.db_pool, id)
        .await
        .map_err(|e| db_error("get chat history", e))?
        .ok_or_else(|| ApiError::not_found("session not found"))?;
    Ok(Json(json!({ "session": session, "messages": messages })))
}

/// `POST /api/admin/chat-history/{id}/archive`
///
/// Archiving hides a session from the default listing; the transcript
/// stays in the database.
pub async fn archive(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    set_archived(&state, id, true).await
}

/// `POST /api/admin/chat-history/{id}/restore`
pub async fn restore(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    set_archived(&state, id, false).await
}

async fn set_archived(state: &AppState, id: i32, archived: bool) -> Result<Json<Value>, ApiError> {
    let updated = chat_sessions::set_archived(&state.db_pool, id, archived)
        .await
        .map_err(|e| db_error("update archive flag", e))?;
    if !updated {
        return Err(ApiError::not_found("session not found"));
    }
    Ok(Json(json!({ "ok": true, "isArchived": archived })))
}
