//! Authentication endpoints: signup, login, guest access, logout.

pub mod extractors;
pub mod password;
pub mod session;

use crate::data;
use crate::state::AppState;
use crate::web::auth::extractors::{AuthedUser, CurrentUser};
use crate::web::auth::password::{check_password_hash, generate_password_hash};
use crate::web::auth::session::{Principal, clear_session_cookie, session_cookie};
use crate::web::error::{ApiError, db_error};
use axum::Json;
use axum::extract::State;
use axum::http::HeaderValue;
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use ulid::Ulid;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn with_session_cookie(mut response: Response, cookie: &str) -> Result<Response, ApiError> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|_| ApiError::internal_error("failed to encode session cookie"))?;
    response.headers_mut().insert(SET_COOKIE, value);
    Ok(response)
}

/// Hashing runs 600k PBKDF2 rounds; keep it off the async workers.
async fn hash_password(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || generate_password_hash(&password))
        .await
        .map_err(|_| ApiError::internal_error("password hashing task failed"))
}

async fn verify_password(stored: String, password: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || check_password_hash(&stored, &password))
        .await
        .map_err(|_| ApiError::internal_error("password check task failed"))
}

/// `POST /api/auth/signup`
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<Response, ApiError> {
    let full_name = req.full_name.trim();
    let email = req.email.trim().to_lowercase();

    if full_name.is_empty() || email.is_empty() {
        return Err(ApiError::bad_request("full name and email are required"));
    }
    if !email.contains('@') {
        return Err(ApiError::bad_request("invalid email address"));
    }
    if req.password != req.confirm_password {
        return Err(ApiError::bad_request("passwords do not match"));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if let Some(domain) = &state.signup_email_domain
        && !email.ends_with(&format!("@{domain}"))
    {
        return Err(ApiError::bad_request(format!(
            "signup requires an @{domain} email address"
        )));
    }

    let password_hash = hash_password(req.password).await?;

    let student = data::students::create(&state.db_pool, full_name, &email, &password_hash)
        .await
        .map_err(|e| db_error("create student", e))?
        .ok_or_else(|| ApiError::conflict("email already registered"))?;

    info!(student_id = student.id, "student account created");

    if let Some(mailer) = &state.mailer {
        let mailer = mailer.clone();
        let (to, name) = (student.email.clone(), student.full_name.clone());
        tokio::spawn(async move {
            mailer.send_welcome(&to, &name).await;
        });
    }

    let auth_session = state
        .session_cache
        .create(Principal::Student(student.id))
        .await
        .map_err(|e| db_error("create session", e))?;

    let cookie = session_cookie(&auth_session.token, state.session_cache.ttl());
    with_session_cookie(
        Json(json!({ "role": "student", "student": student })).into_response(),
        &cookie,
    )
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let email = req.email.trim().to_lowercase();
    let student = data::students::get_by_email(&state.db_pool, &email)
        .await
        .map_err(|e| db_error("student lookup", e))?;

    // Same error for unknown email and wrong password.
    let Some(student) = student else {
        return Err(ApiError::unauthorized("invalid email or password"));
    };
    if !verify_password(student.password_hash.clone(), req.password).await? {
        return Err(ApiError::unauthorized("invalid email or password"));
    }

    let auth_session = state
        .session_cache
        .create(Principal::Student(student.id))
        .await
        .map_err(|e| db_error("create session", e))?;

    let cookie = session_cookie(&auth_session.token, state.session_cache.ttl());
    with_session_cookie(
        Json(json!({ "role": "student", "student": student })).into_response(),
        &cookie,
    )
}

/// `POST /api/auth/guest`
///
/// Issues an anonymous session so visitors can chat without an account.
pub async fn guest(State(state): State<AppState>) -> Result<Response, ApiError> {
    let guest_id = Ulid::new().to_string();

    let auth_session = state
        .session_cache
        .create(Principal::Guest(guest_id.clone()))
        .await
        .map_err(|e| db_error("create session", e))?;

    let cookie = session_cookie(&auth_session.token, state.session_cache.ttl());
    with_session_cookie(
        Json(json!({ "role": "guest", "guestId": guest_id })).into_response(),
        &cookie,
    )
}

/// `POST /api/auth/admin/login`
pub async fn admin_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let email = req.email.trim().to_lowercase();
    let admin = data::admins::get_by_email(&state.db_pool, &email)
        .await
        .map_err(|e| db_error("admin lookup", e))?;

    let Some(admin) = admin else {
        return Err(ApiError::unauthorized("invalid email or password"));
    };
    if !verify_password(admin.password_hash.clone(), req.password).await? {
        return Err(ApiError::unauthorized("invalid email or password"));
    }

    info!(admin_id = admin.id, "admin signed in");

    let auth_session = state
        .session_cache
        .create(Principal::Admin(admin.id))
        .await
        .map_err(|e| db_error("create session", e))?;

    let cookie = session_cookie(&auth_session.token, state.session_cache.ttl());
    with_session_cookie(
        Json(json!({ "role": "admin", "admin": admin })).into_response(),
        &cookie,
    )
}

/// `POST /api/auth/logout`
///
/// Ends the session and drops its in-memory conversation history.
pub async fn logout(
    State(state): State<AppState>,
    authed: AuthedUser,
) -> Result<Response, ApiError> {
    state.engine.reset_history(&authed.token);
    state
        .session_cache
        .delete(&authed.token)
        .await
        .map_err(|e| db_error("delete session", e))?;

    with_session_cookie(
        Json(json!({ "ok": true })).into_response(),
        &clear_session_cookie(),
    )
}

/// `GET /api/auth/me`
pub async fn me(authed: AuthedUser) -> Json<serde_json::Value> {
    let body = match authed.user {
        CurrentUser::Student(student) => json!({ "role": "student", "student": student }),
        CurrentUser::Admin(admin) => json!({ "role": "admin", "admin": admin }),
        CurrentUser::Guest(guest_id) => json!({ "role": "guest", "guestId": guest_id }),
    };
    Json(body)
}
