//! Auth session storage and cookie handling.
//!
//! Sessions are rows in `auth_sessions` fronted by an in-memory cache so the
//! common request path skips the database. Tokens are opaque random strings
//! carried in an HTTP-only cookie.

use crate::data::models::AuthSession;
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use cookie::{Cookie, SameSite};
use dashmap::DashMap;
use rand::Rng;
use rand::distr::Alphanumeric;
use sqlx::PgPool;
use std::sync::Arc;

pub const SESSION_COOKIE: &str = "beacon_session";

const TOKEN_LEN: usize = 48;

fn new_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// The account a session was issued to.
#[derive(Debug, Clone)]
pub enum Principal {
    Student(i32),
    Admin(i32),
    Guest(String),
}

#[derive(Clone)]
pub struct SessionCache {
    db_pool: PgPool,
    cache: Arc<DashMap<String, AuthSession>>,
    ttl: Duration,
}

impl SessionCache {
    pub fn new(db_pool: PgPool, ttl: Duration) -> Self {
        Self {
            db_pool,
            cache: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a session for a principal and persist it.
    pub async fn create(&self, principal: Principal) -> Result<AuthSession> {
        let token = new_token();
        let expires_at = Utc::now() + self.ttl;

        let (student_id, admin_id, guest_id) = match &principal {
            Principal::Student(id) => (Some(*id), None, None),
            Principal::Admin(id) => (None, Some(*id), None),
            Principal::Guest(id) => (None, None, Some(id.clone())),
        };

        let session = sqlx::query_as::<_, AuthSession>(
            r#"
            INSERT INTO auth_sessions (token, student_id, admin_id, guest_id, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING token, student_id, admin_id, guest_id, created_at, expires_at
            "#,
        )
        .bind(&token)
        .bind(student_id)
        .bind(admin_id)
        .bind(guest_id)
        .bind(expires_at)
        .fetch_one(&self.db_pool)
        .await
        .context("failed to insert auth session")?;

        self.cache.insert(token, session.clone());
        Ok(session)
    }

    /// Resolve a token to a live session. Expired sessions are evicted and
    /// report as absent.
    pub async fn get(&self, token: &str) -> Result<Option<AuthSession>> {
        if let Some(session) = self.cache.get(token) {
            if session.expires_at > Utc::now() {
                return Ok(Some(session.clone()));
            }
            drop(session);
            self.delete(token).await?;
            return Ok(None);
        }

        let session = sqlx::query_as::<_, AuthSession>(
            r#"
            SELECT token, student_id, admin_id, guest_id, created_at, expires_at
            FROM auth_sessions WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.db_pool)
        .await
        .context("failed to fetch auth session")?;

        match session {
            Some(session) if session.expires_at > Utc::now() => {
                self.cache.insert(token.to_string(), session.clone());
                Ok(Some(session))
            }
            Some(_) => {
                self.delete(token).await?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Remove a session from cache and database.
    pub async fn delete(&self, token: &str) -> Result<()> {
        self.cache.remove(token);
        sqlx::query("DELETE FROM auth_sessions WHERE token = $1")
            .bind(token)
            .execute(&self.db_pool)
            .await
            .context("failed to delete auth session")?;
        Ok(())
    }

    /// Drop every expired row and return the purged tokens so callers can
    /// release any per-session state tied to them.
    pub async fn purge_expired(&self) -> Result<Vec<String>> {
        let now = Utc::now();
        self.cache.retain(|_, session| session.expires_at > now);
        let rows: Vec<(String,)> =
            sqlx::query_as("DELETE FROM auth_sessions WHERE expires_at <= $1 RETURNING token")
                .bind(now)
                .fetch_all(&self.db_pool)
                .await
                .context("failed to purge expired sessions")?;
        Ok(rows.into_iter().map(|(token,)| token).collect())
    }
}

/// `Set-Cookie` value for a freshly issued session.
pub fn session_cookie(token: &str, ttl: Duration) -> String {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::seconds(ttl.num_seconds()))
        .build()
        .to_string()
}

/// `Set-Cookie` value that clears the session cookie.
pub fn clear_session_cookie() -> String {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::seconds(0))
        .build()
        .to_string()
}

/// Pull the session token out of a request's `Cookie` header.
pub fn token_from_headers(headers: &axum::http::HeaderMap) -> Option<String> {
    let raw = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    for cookie in Cookie::split_parse(raw).flatten() {
        if cookie.name() == SESSION_COOKIE {
            return Some(cookie.value().to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_long_and_unique() {
        let a = new_token();
        let b = new_token();
        assert_eq!(a.len(), TOKEN_LEN);
        assert_ne!(a, b);
    }

    #[test]
    fn test_cookie_round_trip() {
        let set = session_cookie("abc123", Duration::hours(1));
        assert!(set.contains("beacon_session=abc123"));
        assert!(set.contains("HttpOnly"));

        let mut headers = axum::http::HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            "other=1; beacon_session=abc123".parse().unwrap(),
        );
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_clear_cookie_zeroes_max_age() {
        let cleared = clear_session_cookie();
        assert!(cleared.contains("Max-Age=0"));
    }
}
