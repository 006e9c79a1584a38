//! Application state shared across components (web handlers, chatbot, refresh tasks).

use crate::chatbot::ChatEngine;
use crate::chatbot::matching::{MatchCandidate, normalize_text};
use crate::email::Mailer;
use crate::web::auth::session::SessionCache;
use anyhow::Result;
use dashmap::DashMap;
use serde::Serialize;
use sqlx::PgPool;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Health status of a service.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Active,
    Connected,
    Disabled,
    Error,
}

/// A timestamped status entry for a service.
#[derive(Debug, Clone)]
pub struct StatusEntry {
    pub status: ServiceStatus,
    #[allow(dead_code)]
    pub updated_at: Instant,
}

/// Thread-safe registry for services to self-report their health status.
#[derive(Debug, Clone, Default)]
pub struct ServiceStatusRegistry {
    inner: Arc<DashMap<String, StatusEntry>>,
}

impl ServiceStatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or updates the status for a named service.
    pub fn set(&self, name: &str, status: ServiceStatus) {
        self.inner.insert(
            name.to_owned(),
            StatusEntry {
                status,
                updated_at: Instant::now(),
            },
        );
    }

    /// Returns a snapshot of all service statuses.
    pub fn all(&self) -> Vec<(String, ServiceStatus)> {
        self.inner
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().status.clone()))
            .collect()
    }
}

/// In-memory index of every matchable phrase in the Q&A corpus.
///
/// Loaded from the `questions` and `synonyms` tables on startup, refreshed
/// periodically, and rebuilt eagerly after admin corpus edits. Phrases are
/// pre-normalized so each chat message pays normalization cost once.
pub struct QaIndex {
    candidates: Vec<MatchCandidate>,
}

impl Default for QaIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl QaIndex {
    pub fn new() -> Self {
        Self {
            candidates: Vec::new(),
        }
    }

    /// Build an index from `(question_id, phrase)` rows. Phrases that
    /// normalize to nothing are dropped.
    pub fn from_rows(rows: Vec<(i32, String)>) -> Self {
        let candidates = rows
            .into_iter()
            .filter_map(|(question_id, phrase)| {
                let normalized = normalize_text(&phrase);
                if normalized.is_empty() {
                    None
                } else {
                    Some(MatchCandidate {
                        question_id,
                        normalized,
                    })
                }
            })
            .collect();
        Self { candidates }
    }

    pub fn candidates(&self) -> &[MatchCandidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub engine: Arc<ChatEngine>,
    pub qa_index: Arc<RwLock<QaIndex>>,
    pub session_cache: SessionCache,
    pub service_statuses: ServiceStatusRegistry,
    pub mailer: Option<Arc<Mailer>>,
    pub upload_dir: PathBuf,
    pub signup_email_domain: Option<String>,
}

impl AppState {
    pub fn new(
        db_pool: PgPool,
        engine: Arc<ChatEngine>,
        qa_index: Arc<RwLock<QaIndex>>,
        session_cache: SessionCache,
        mailer: Option<Arc<Mailer>>,
        upload_dir: PathBuf,
        signup_email_domain: Option<String>,
    ) -> Self {
        Self {
            db_pool,
            engine,
            qa_index,
            session_cache,
            service_statuses: ServiceStatusRegistry::new(),
            mailer,
            upload_dir,
            signup_email_domain,
        }
    }

    /// Initialize the match index from the database.
    pub async fn load_qa_index(&self) -> Result<()> {
        let rows = crate::data::qa::match_rows(&self.db_pool).await?;
        let index = QaIndex::from_rows(rows);
        let count = index.len();
        *self.qa_index.write().await = index;
        tracing::info!(phrases = count, "Q&A match index loaded");
        Ok(())
    }

    /// Drop expired auth sessions together with the in-memory conversation
    /// history keyed by their tokens. Without the second step, abandoned
    /// guest sessions would pin their history in the engine forever.
    pub async fn purge_expired_sessions(&self) -> Result<usize> {
        let tokens = self.session_cache.purge_expired().await?;
        for token in &tokens {
            self.engine.reset_history(token);
        }
        Ok(tokens.len())
    }

    /// Spawn a background task that refreshes the match index every `interval`.
    /// The task runs until the process exits.
    pub fn spawn_qa_index_refresh(&self, interval: std::time::Duration) {
        let state = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // skip the immediate first tick
            loop {
                ticker.tick().await;
                if let Err(e) = state.load_qa_index().await {
                    tracing::warn!(error = %e, "Failed to refresh Q&A match index");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_normalizes_and_drops_empty_phrases() {
        let index = QaIndex::from_rows(vec![
            (1, "What are the FEES?".to_string()),
            (1, "  ?!  ".to_string()),
            (2, "Hostel accommodation".to_string()),
        ]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.candidates()[0].normalized, "what are the fees");
        assert_eq!(index.candidates()[1].question_id, 2);
    }

    #[test]
    fn test_status_registry_snapshot() {
        let registry = ServiceStatusRegistry::new();
        registry.set("database", ServiceStatus::Connected);
        registry.set("llm", ServiceStatus::Disabled);
        registry.set("llm", ServiceStatus::Active);

        let all = registry.all();
        assert_eq!(all.len(), 2);
        assert!(
            all.iter()
                .any(|(name, status)| name == "llm" && *status == ServiceStatus::Active)
        );
    }
}
