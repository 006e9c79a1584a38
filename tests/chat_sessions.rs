//! Tests for saved chat sessions: naming, owner isolation, and archiving.

mod helpers;

use beacon::data::chat_sessions::{self, SessionOwner};
use helpers::insert_student;
use serde_json::json;
use sqlx::PgPool;

fn transcript() -> serde_json::Value {
    json!([
        { "role": "user", "content": "when does registration open" },
        { "role": "assistant", "content": "Registration opens in September." },
    ])
}

#[sqlx::test]
async fn test_save_assigns_sequential_names_per_owner(pool: PgPool) {
    let student = insert_student(&pool, "Ama Mensah", "ama@st.rmu.edu.gh").await;
    let owner = SessionOwner::Student(student.id);

    let first = chat_sessions::save(&pool, &owner, &transcript())
        .await
        .expect("save failed");
    let second = chat_sessions::save(&pool, &owner, &transcript())
        .await
        .expect("save failed");

    assert_eq!(first.session_name, "Chat 1");
    assert_eq!(second.session_name, "Chat 2");

    // A different owner starts back at Chat 1.
    let guest = SessionOwner::Guest("guest-abc".to_string());
    let guest_first = chat_sessions::save(&pool, &guest, &transcript())
        .await
        .expect("save failed");
    assert_eq!(guest_first.session_name, "Chat 1");
}

#[sqlx::test]
async fn test_sessions_are_owner_scoped(pool: PgPool) {
    let student = insert_student(&pool, "Kofi Boateng", "kofi@st.rmu.edu.gh").await;
    let owner = SessionOwner::Student(student.id);
    let stranger = SessionOwner::Guest("guest-xyz".to_string());

    let saved = chat_sessions::save(&pool, &owner, &transcript())
        .await
        .expect("save failed");

    // The stranger sees nothing and cannot load or delete the session.
    assert!(
        chat_sessions::list(&pool, &stranger)
            .await
            .expect("list failed")
            .is_empty()
    );
    assert!(
        chat_sessions::load(&pool, &stranger, saved.id)
            .await
            .expect("load failed")
            .is_none()
    );
    assert!(
        !chat_sessions::delete(&pool, &stranger, saved.id)
            .await
            .expect("delete failed")
    );

    // The owner still has it.
    let (summary, messages) = chat_sessions::load(&pool, &owner, saved.id)
        .await
        .expect("load failed")
        .expect("session missing for owner");
    assert_eq!(summary.session_name, "Chat 1");
    assert_eq!(messages, transcript());

    assert!(
        chat_sessions::delete(&pool, &owner, saved.id)
            .await
            .expect("delete failed")
    );
    assert!(
        chat_sessions::list(&pool, &owner)
            .await
            .expect("list failed")
            .is_empty()
    );
}

#[sqlx::test]
async fn test_admin_list_labels_owners(pool: PgPool) {
    let student = insert_student(&pool, "Esi Owusu", "esi@st.rmu.edu.gh").await;
    chat_sessions::save(&pool, &SessionOwner::Student(student.id), &transcript())
        .await
        .expect("save failed");
    chat_sessions::save(
        &pool,
        &SessionOwner::Guest("guest-42".to_string()),
        &transcript(),
    )
    .await
    .expect("save failed");

    let rows = chat_sessions::admin_list(&pool, true)
        .await
        .expect("admin_list failed");
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().any(|r| r.owner_label == "Esi Owusu"));
    assert!(rows.iter().any(|r| r.owner_label == "Guest guest-42"));
}

#[sqlx::test]
async fn test_archive_hides_from_default_listing(pool: PgPool) {
    let owner = SessionOwner::Guest("guest-arch".to_string());
    let saved = chat_sessions::save(&pool, &owner, &transcript())
        .await
        .expect("save failed");

    assert!(
        chat_sessions::set_archived(&pool, saved.id, true)
            .await
            .expect("archive failed")
    );

    let visible = chat_sessions::admin_list(&pool, false)
        .await
        .expect("admin_list failed");
    assert!(visible.is_empty(), "archived session should be hidden");

    let all = chat_sessions::admin_list(&pool, true)
        .await
        .expect("admin_list failed");
    assert_eq!(all.len(), 1);
    assert!(all[0].is_archived);

    // Restore brings it back; the transcript was never touched.
    assert!(
        chat_sessions::set_archived(&pool, saved.id, false)
            .await
            .expect("restore failed")
    );
    let (row, messages) = chat_sessions::admin_get(&pool, saved.id)
        .await
        .expect("admin_get failed")
        .expect("session missing");
    assert!(!row.is_archived);
    assert_eq!(messages, transcript());
}
