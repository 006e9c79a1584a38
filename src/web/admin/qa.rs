//! Admin Q&A corpus management.
//!
//! Corpus mutations rebuild the in-memory match index right away so the
//! chatbot picks up edits without waiting for the periodic refresh.

use crate::data::qa;
use crate::state::AppState;
use crate::web::auth::extractors::AdminUser;
use crate::web::error::{ApiError, db_error};
use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

#[derive(Debug, Deserialize)]
pub struct QaRequest {
    pub question: String,
    pub answer: String,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SynonymRequest {
    pub synonym: String,
}

fn validate(req: &QaRequest) -> Result<(), ApiError> {
    if req.question.trim().is_empty() || req.answer.trim().is_empty() {
        return Err(ApiError::bad_request("question and answer are required"));
    }
    Ok(())
}

async fn reload_index(state: &AppState) {
    if let Err(e) = state.load_qa_index().await {
        warn!(error = %e, "failed to rebuild match index after corpus edit");
    }
}

/// `GET /api/admin/qa`
pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Value>, ApiError> {
    let pairs = qa::list(&state.db_pool)
        .await
        .map_err(|e| db_error("list Q&A pairs", e))?;
    Ok(Json(json!({ "questions": pairs })))
}

/// `GET /api/admin/qa/{id}`
pub async fn get(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let pair = qa::get(&state.db_pool, id)
        .await
        .map_err(|e| db_error("get Q&A pair", e))?
        .ok_or_else(|| ApiError::not_found("question not found"))?;
    Ok(Json(json!({ "question": pair })))
}

/// `POST /api/admin/qa`
pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(req): Json<QaRequest>,
) -> Result<Json<Value>, ApiError> {
    validate(&req)?;
    let id = qa::create(
        &state.db_pool,
        req.question.trim(),
        req.answer.trim(),
        req.category.as_deref().map(str::trim).filter(|c| !c.is_empty()),
    )
    .await
    .map_err(|e| db_error("create Q&A pair", e))?;

    reload_index(&state).await;
    Ok(Json(json!({ "id": id })))
}

/// `PUT /api/admin/qa/{id}`
pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
    Json(req): Json<QaRequest>,
) -> Result<Json<Value>, ApiError> {
    validate(&req)?;
    let updated = qa::update(
        &state.db_pool,
        id,
        req.question.trim(),
        req.answer.trim(),
        req.category.as_deref().map(str::trim).filter(|c| !c.is_empty()),
    )
    .await
    .map_err(|e| db_error("update Q&A pair", e))?;

    if !updated {
        return Err(ApiError::not_found("question not found"));
    }
    reload_index(&state).await;
    Ok(Json(json!({ "ok": true })))
}

/// `DELETE /api/admin/qa/{id}`
pub async fn delete(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let deleted = qa::delete(&state.db_pool, id)
        .await
        .map_err(|e| db_error("delete Q&A pair", e))?;
    if !deleted {
        return Err(ApiError::not_found("question not found"));
    }
    reload_index(&state).await;
    Ok(Json(json!({ "ok": true })))
}

/// `POST /api/admin/qa/{id}/synonyms`
pub async fn add_synonym(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
    Json(req): Json<SynonymRequest>,
) -> Result<Json<Value>, ApiError> {
    let phrase = req.synonym.trim();
    if phrase.is_empty() {
        return Err(ApiError::bad_request("synonym must not be empty"));
    }

    let synonym = qa::add_synonym(&state.db_pool, id, phrase)
        .await
        .map_err(|e| db_error("add synonym", e))?
        .ok_or_else(|| ApiError::not_found("question not found"))?;

    reload_index(&state).await;
    Ok(Json(json!({ "synonym": synonym })))
}

/// `DELETE /api/admin/qa/synonyms/{id}`
pub async fn delete_synonym(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let deleted = qa::delete_synonym(&state.db_pool, id)
        .await
        .map_err(|e| db_error("delete synonym", e))?;
    if !deleted {
        return Err(ApiError::not_found("synonym not found"));
    }
    reload_index(&state).await;
    Ok(Json(json!({ "ok": true })))
}
