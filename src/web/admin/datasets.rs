//! Admin dataset uploads.

use crate::data::uploads;
use crate::state::AppState;
use crate::web::auth::extractors::AdminUser;
use crate::web::error::{ApiError, db_error};
use axum::Json;
use axum::extract::{Multipart, Path, State};
use serde_json::{Value, json};
use tracing::info;

const ALLOWED_EXTENSIONS: &[&str] = &[".json", ".jsonl"];

fn allowed_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    ALLOWED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// `POST /api/admin/datasets`
///
/// Accepts one multipart file field. Only `.json` and `.jsonl` files are
/// stored.
pub async fn upload(
    State(state): State<AppState>,
    _admin: AdminUser,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {e}")))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };

        if !allowed_name(&filename) {
            return Err(ApiError::bad_request(
                "only .json and .jsonl files are accepted",
            ));
        }
        uploads::validate_name(&filename)
            .map_err(|_| ApiError::bad_request("invalid dataset filename"))?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("failed to read upload: {e}")))?;
        if bytes.is_empty() {
            return Err(ApiError::bad_request("uploaded file is empty"));
        }

        let dataset = uploads::save(&state.upload_dir, &filename, &bytes)
            .await
            .map_err(|e| db_error("store dataset", e))?;

        info!(name = %dataset.name, bytes = dataset.size_bytes, "dataset uploaded");
        return Ok(Json(json!({ "dataset": dataset })));
    }

    Err(ApiError::bad_request("no file field in upload"))
}

/// `GET /api/admin/datasets`
pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Value>, ApiError> {
    let datasets = uploads::list(&state.upload_dir)
        .await
        .map_err(|e| db_error("list datasets", e))?;
    Ok(Json(json!({ "datasets": datasets })))
}

/// `GET /api/admin/datasets/{name}/preview`
pub async fn preview(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    uploads::validate_name(&name).map_err(|_| ApiError::bad_request("invalid dataset name"))?;

    let lines = uploads::preview(&state.upload_dir, &name)
        .await
        .map_err(|e| db_error("preview dataset", e))?
        .ok_or_else(|| ApiError::not_found("dataset not found"))?;
    Ok(Json(json!({ "name": name, "lines": lines })))
}

/// `POST /api/admin/datasets/{name}/import`
///
/// Loads a chat-format JSONL dataset into the Q&A corpus and rebuilds the
/// match index.
pub async fn import(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    uploads::validate_name(&name).map_err(|_| ApiError::bad_request("invalid dataset name"))?;

    let report = uploads::import(&state.db_pool, &state.upload_dir, &name)
        .await
        .map_err(|e| db_error("import dataset", e))?
        .ok_or_else(|| ApiError::not_found("dataset not found"))?;

    if let Err(e) = state.load_qa_index().await {
        tracing::warn!(error = %e, "failed to rebuild match index after import");
    }

    info!(name = %name, imported = report.imported, skipped = report.skipped, "dataset imported");
    Ok(Json(json!({ "report": report })))
}
