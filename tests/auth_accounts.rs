//! Tests for account storage and auth sessions.

mod helpers;

use beacon::chatbot::ChatEngine;
use beacon::data::{admins, students};
use beacon::llm::ChatMessage;
use beacon::state::{AppState, QaIndex};
use beacon::web::auth::password::{check_password_hash, generate_password_hash};
use beacon::web::auth::session::{Principal, SessionCache};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::RwLock;

#[sqlx::test]
async fn test_duplicate_email_is_rejected(pool: PgPool) {
    let hash = generate_password_hash("first-password");
    let created = students::create(&pool, "Ama Mensah", "ama@st.rmu.edu.gh", &hash)
        .await
        .expect("create failed");
    assert!(created.is_some());

    let duplicate = students::create(&pool, "Impostor", "ama@st.rmu.edu.gh", &hash)
        .await
        .expect("create failed");
    assert!(duplicate.is_none(), "second signup with same email must fail");

    // The original account is untouched.
    let stored = students::get_by_email(&pool, "ama@st.rmu.edu.gh")
        .await
        .expect("lookup failed")
        .expect("student missing");
    assert_eq!(stored.full_name, "Ama Mensah");
    assert!(check_password_hash(&stored.password_hash, "first-password"));
}

#[sqlx::test]
async fn test_seed_admin_keeps_existing_password(pool: PgPool) {
    let original_hash = generate_password_hash("original");
    let admin = admins::ensure_seed_admin(&pool, "Administrator", "admin@rmu.edu.gh", &original_hash)
        .await
        .expect("seed failed");

    // Re-seeding with a new password must not overwrite the stored hash.
    let new_hash = generate_password_hash("rotated");
    let reseeded = admins::ensure_seed_admin(&pool, "Administrator", "admin@rmu.edu.gh", &new_hash)
        .await
        .expect("seed failed");

    assert_eq!(admin.id, reseeded.id);
    assert!(check_password_hash(&reseeded.password_hash, "original"));
    assert!(!check_password_hash(&reseeded.password_hash, "rotated"));
}

#[sqlx::test]
async fn test_session_round_trip_and_logout(pool: PgPool) {
    let student = helpers::insert_student(&pool, "Kojo Asante", "kojo@st.rmu.edu.gh").await;
    let sessions = SessionCache::new(pool.clone(), chrono::Duration::hours(1));

    let session = sessions
        .create(Principal::Student(student.id))
        .await
        .expect("create session failed");

    let resolved = sessions
        .get(&session.token)
        .await
        .expect("get session failed")
        .expect("session missing");
    assert_eq!(resolved.student_id, Some(student.id));
    assert_eq!(resolved.admin_id, None);

    sessions
        .delete(&session.token)
        .await
        .expect("delete session failed");
    assert!(
        sessions
            .get(&session.token)
            .await
            .expect("get session failed")
            .is_none()
    );
}

#[sqlx::test]
async fn test_expired_sessions_resolve_as_absent(pool: PgPool) {
    let sessions = SessionCache::new(pool.clone(), chrono::Duration::seconds(-1));

    let session = sessions
        .create(Principal::Guest("guest-exp".to_string()))
        .await
        .expect("create session failed");

    // TTL already elapsed; the token must not authenticate.
    assert!(
        sessions
            .get(&session.token)
            .await
            .expect("get session failed")
            .is_none()
    );

    // And the purge removes the dead row.
    let fresh = SessionCache::new(pool.clone(), chrono::Duration::hours(1));
    let purged = fresh.purge_expired().await.expect("purge failed");
    assert!(purged.is_empty(), "expired row was already evicted on lookup");
}

#[sqlx::test]
async fn test_purge_drops_expired_session_history(pool: PgPool) {
    let sessions = SessionCache::new(pool.clone(), chrono::Duration::seconds(-1));
    let session = sessions
        .create(Principal::Guest("guest-gone".to_string()))
        .await
        .expect("create session failed");

    let qa_index = Arc::new(RwLock::new(QaIndex::new()));
    let engine = Arc::new(ChatEngine::new(
        pool.clone(),
        None,
        "model".to_string(),
        "model".to_string(),
        None,
        qa_index.clone(),
    ));
    let state = AppState::new(
        pool.clone(),
        engine.clone(),
        qa_index,
        sessions,
        None,
        "uploads".into(),
        None,
    );

    engine.set_history(
        &session.token,
        vec![
            ChatMessage::user("hello"),
            ChatMessage::assistant("Hello! How can I assist you today?"),
        ],
    );
    assert!(!engine.history(&session.token).is_empty());

    // Purging the expired session must also release its conversation history.
    let purged = state
        .purge_expired_sessions()
        .await
        .expect("purge failed");
    assert_eq!(purged, 1);
    assert!(engine.history(&session.token).is_empty());
}

#[sqlx::test]
async fn test_one_principal_per_session(pool: PgPool) {
    // The table constraint rejects rows with no principal at all.
    let result = sqlx::query(
        "INSERT INTO auth_sessions (token, expires_at) VALUES ('broken', now() + interval '1 hour')",
    )
    .execute(&pool)
    .await;
    assert!(result.is_err(), "principal-less session must violate the check");
}
