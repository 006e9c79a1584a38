//! Admin feedback review and export.

use crate::data::feedback;
use crate::state::AppState;
use crate::web::auth::extractors::AdminUser;
use crate::web::error::{ApiError, db_error};
use axum::Json;
use axum::extract::State;
use axum::http::HeaderValue;
use axum::http::header::CONTENT_DISPOSITION;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

/// `GET /api/admin/feedback`
pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Value>, ApiError> {
    let entries = feedback::list(&state.db_pool)
        .await
        .map_err(|e| db_error("list feedback", e))?;
    let stats = feedback::stats(&state.db_pool)
        .await
        .map_err(|e| db_error("feedback stats", e))?;
    Ok(Json(json!({ "feedback": entries, "stats": stats })))
}

/// `GET /api/admin/feedback/export`
///
/// Downloads all feedback as a dated JSON attachment.
pub async fn export(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Response, ApiError> {
    let entries = feedback::list(&state.db_pool)
        .await
        .map_err(|e| db_error("export feedback", e))?;

    let filename = format!("feedback_{}.json", chrono::Utc::now().format("%Y-%m-%d"));
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .map_err(|_| ApiError::internal_error("failed to build export header"))?;

    let mut response = Json(entries).into_response();
    response.headers_mut().insert(CONTENT_DISPOSITION, disposition);
    Ok(response)
}
