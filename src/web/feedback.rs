//! Public feedback submission.

use crate::data::feedback;
use crate::state::AppState;
use crate::web::auth::extractors::AuthedUser;
use crate::web::error::{ApiError, db_error};
use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Value, json};

const MAX_COMMENT_LEN: usize = 2000;

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub rating: i32,
    pub comment: Option<String>,
}

/// `POST /api/feedback`
pub async fn submit(
    State(state): State<AppState>,
    authed: AuthedUser,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<Value>, ApiError> {
    if !(1..=5).contains(&req.rating) {
        return Err(ApiError::bad_request("rating must be between 1 and 5"));
    }
    let comment = req
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    if comment.is_some_and(|c| c.len() > MAX_COMMENT_LEN) {
        return Err(ApiError::bad_request(format!(
            "comment must be at most {MAX_COMMENT_LEN} characters"
        )));
    }

    let row = feedback::insert(&state.db_pool, req.rating, comment, authed.student_id())
        .await
        .map_err(|e| db_error("submit feedback", e))?;

    Ok(Json(json!({ "feedback": row })))
}
