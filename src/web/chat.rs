//! Chat endpoints.

use crate::data::usage::{self, UsageEntry};
use crate::state::AppState;
use crate::utils::log_if_slow;
use crate::web::auth::extractors::AuthedUser;
use crate::web::error::{ApiError, db_error};
use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Instant;
use tracing::warn;

const MAX_MESSAGE_LEN: usize = 2000;

/// Pipelines slower than this get a warning log.
const SLOW_PIPELINE: std::time::Duration = std::time::Duration::from_secs(10);

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// `POST /api/chat`
///
/// Runs the answer pipeline for one message and records a usage log row.
pub async fn chat(
    State(state): State<AppState>,
    authed: AuthedUser,
    Json(req): Json<ChatRequest>,
) -> Result<Json<Value>, ApiError> {
    // Only students and guests chat; admin sessions have no conversation.
    if authed.owner().is_none() {
        return Err(ApiError::forbidden("chat requires a student or guest session"));
    }

    let message = req.message.trim();
    if message.is_empty() {
        return Err(ApiError::bad_request("message must not be empty"));
    }
    if message.len() > MAX_MESSAGE_LEN {
        return Err(ApiError::bad_request(format!(
            "message must be at most {MAX_MESSAGE_LEN} characters"
        )));
    }

    let start = Instant::now();
    let outcome = state
        .engine
        .respond(&authed.token, message)
        .await
        .map_err(|e| db_error("chat pipeline", e))?;
    let latency_ms = start.elapsed().as_millis().min(i32::MAX as u128) as i32;
    log_if_slow(start, SLOW_PIPELINE, "chat pipeline");

    let intent = state.engine.classify_intent(message).await;

    // Logging must never fail the chat response.
    let user_ref = authed.user_ref();
    let entry = UsageEntry {
        user_ref: &user_ref,
        message,
        intent: intent.as_str(),
        answer_source: outcome.source.as_str(),
        fallback: intent.is_unknown(),
        latency_ms,
        reply: &outcome.reply,
    };
    if let Err(e) = usage::insert(&state.db_pool, entry).await {
        warn!(error = %e, "failed to record usage log");
    }

    Ok(Json(json!({
        "reply": outcome.reply,
        "source": outcome.source.as_str(),
        "intent": intent.as_str(),
    })))
}

/// `POST /api/chat/reset`
///
/// Clears this session's conversation history.
pub async fn reset(State(state): State<AppState>, authed: AuthedUser) -> Json<Value> {
    state.engine.reset_history(&authed.token);
    Json(json!({ "ok": true }))
}
