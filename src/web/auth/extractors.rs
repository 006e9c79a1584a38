//! Request extractors for authenticated principals.

use crate::data;
use crate::data::chat_sessions::SessionOwner;
use crate::data::models::{Admin, Student};
use crate::state::AppState;
use crate::web::auth::session::token_from_headers;
use crate::web::error::{ApiError, db_error};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// The signed-in principal behind a request.
#[derive(Debug, Clone)]
pub enum CurrentUser {
    Student(Student),
    Admin(Admin),
    Guest(String),
}

/// Any authenticated session: student, admin, or guest.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub token: String,
    pub user: CurrentUser,
}

impl AuthedUser {
    /// Stable identifier recorded in usage logs.
    pub fn user_ref(&self) -> String {
        match &self.user {
            CurrentUser::Student(s) => format!("student:{}", s.id),
            CurrentUser::Admin(a) => format!("admin:{}", a.id),
            CurrentUser::Guest(id) => format!("guest:{id}"),
        }
    }

    /// The owner key for saved chat sessions. Admins don't own sessions.
    pub fn owner(&self) -> Option<SessionOwner> {
        match &self.user {
            CurrentUser::Student(s) => Some(SessionOwner::Student(s.id)),
            CurrentUser::Guest(id) => Some(SessionOwner::Guest(id.clone())),
            CurrentUser::Admin(_) => None,
        }
    }

    pub fn student_id(&self) -> Option<i32> {
        match &self.user {
            CurrentUser::Student(s) => Some(s.id),
            _ => None,
        }
    }
}

async fn resolve(parts: &Parts, state: &AppState) -> Result<AuthedUser, ApiError> {
    let token = token_from_headers(&parts.headers)
        .ok_or_else(|| ApiError::unauthorized("authentication required"))?;

    let session = state
        .session_cache
        .get(&token)
        .await
        .map_err(|e| db_error("session lookup", e))?
        .ok_or_else(|| ApiError::unauthorized("session expired or unknown"))?;

    let user = if let Some(student_id) = session.student_id {
        let student = data::students::get_by_id(&state.db_pool, student_id)
            .await
            .map_err(|e| db_error("student lookup", e))?
            .ok_or_else(|| ApiError::unauthorized("account no longer exists"))?;
        CurrentUser::Student(student)
    } else if let Some(admin_id) = session.admin_id {
        let admin = data::admins::get_by_id(&state.db_pool, admin_id)
            .await
            .map_err(|e| db_error("admin lookup", e))?
            .ok_or_else(|| ApiError::unauthorized("account no longer exists"))?;
        CurrentUser::Admin(admin)
    } else if let Some(guest_id) = session.guest_id {
        CurrentUser::Guest(guest_id)
    } else {
        // Unreachable under the one-principal constraint.
        return Err(ApiError::unauthorized("malformed session"));
    };

    Ok(AuthedUser { token, user })
}

impl FromRequestParts<AppState> for AuthedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        resolve(parts, state).await
    }
}

/// An authenticated admin. Rejects signed-in non-admins with 403.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub token: String,
    pub admin: Admin,
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let authed = resolve(parts, state).await?;
        match authed.user {
            CurrentUser::Admin(admin) => Ok(AdminUser {
                token: authed.token,
                admin,
            }),
            _ => Err(ApiError::forbidden("admin access required")),
        }
    }
}

/// A student or guest who can own saved chat sessions.
#[derive(Debug, Clone)]
pub struct SessionOwnerUser {
    pub token: String,
    pub owner: SessionOwner,
    pub student_id: Option<i32>,
}

impl FromRequestParts<AppState> for SessionOwnerUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let authed = resolve(parts, state).await?;
        let student_id = authed.student_id();
        match authed.owner() {
            Some(owner) => Ok(SessionOwnerUser {
                token: authed.token,
                owner,
                student_id,
            }),
            None => Err(ApiError::forbidden("admins do not own chat sessions")),
        }
    }
}
