//! Admin management of memory corrections.

use crate::data::memory;
use crate::state::AppState;
use crate::web::auth::extractors::AdminUser;
use crate::web::error::{ApiError, db_error};
use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionRequest {
    pub corrected_question: String,
    pub corrected_answer: String,
    pub original_answer: Option<String>,
}

fn validate(req: &CorrectionRequest) -> Result<(), ApiError> {
    if req.corrected_question.trim().is_empty() || req.corrected_answer.trim().is_empty() {
        return Err(ApiError::bad_request(
            "corrected question and answer are required",
        ));
    }
    Ok(())
}

/// `GET /api/admin/memory`
pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Value>, ApiError> {
    let corrections = memory::list(&state.db_pool)
        .await
        .map_err(|e| db_error("list memory corrections", e))?;
    Ok(Json(json!({ "corrections": corrections })))
}

/// `POST /api/admin/memory`
pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(req): Json<CorrectionRequest>,
) -> Result<Json<Value>, ApiError> {
    validate(&req)?;
    let correction = memory::insert(
        &state.db_pool,
        req.corrected_question.trim(),
        req.original_answer.as_deref(),
        req.corrected_answer.trim(),
    )
    .await
    .map_err(|e| db_error("create memory correction", e))?;
    Ok(Json(json!({ "correction": correction })))
}

/// `PUT /api/admin/memory/{id}`
pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
    Json(req): Json<CorrectionRequest>,
) -> Result<Json<Value>, ApiError> {
    validate(&req)?;
    let updated = memory::update(
        &state.db_pool,
        id,
        req.corrected_question.trim(),
        req.corrected_answer.trim(),
    )
    .await
    .map_err(|e| db_error("update memory correction", e))?;
    if !updated {
        return Err(ApiError::not_found("correction not found"));
    }
    Ok(Json(json!({ "ok": true })))
}

/// `DELETE /api/admin/memory/{id}`
pub async fn delete(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let deleted = memory::delete(&state.db_pool, id)
        .await
        .map_err(|e| db_error("delete memory correction", e))?;
    if !deleted {
        return Err(ApiError::not_found("correction not found"));
    }
    Ok(Json(json!({ "ok": true })))
}
