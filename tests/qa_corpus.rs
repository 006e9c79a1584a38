//! Tests for the Q&A corpus: CRUD, synonyms, and the fuzzy match index.

mod helpers;

use beacon::chatbot::matching::best_match;
use beacon::data::qa;
use beacon::state::QaIndex;
use helpers::insert_qa;
use sqlx::PgPool;

async fn build_index(pool: &PgPool) -> QaIndex {
    let rows = qa::match_rows(pool).await.expect("match_rows failed");
    QaIndex::from_rows(rows)
}

#[sqlx::test]
async fn test_create_and_get_answer(pool: PgPool) {
    let id = insert_qa(
        &pool,
        "What are the tuition fees?",
        "Tuition is published each semester on the bursar page.",
    )
    .await;

    let answer = qa::get_answer(&pool, id).await.expect("get_answer failed");
    assert_eq!(
        answer.as_deref(),
        Some("Tuition is published each semester on the bursar page.")
    );

    let pair = qa::get(&pool, id)
        .await
        .expect("get failed")
        .expect("pair missing");
    assert_eq!(pair.question, "What are the tuition fees?");
    assert!(pair.synonyms.is_empty());
}

#[sqlx::test]
async fn test_update_rewrites_question_and_answer(pool: PgPool) {
    let id = insert_qa(&pool, "Old question?", "Old answer.").await;

    let updated = qa::update(&pool, id, "New question?", "New answer.", Some("fees"))
        .await
        .expect("update failed");
    assert!(updated);

    let pair = qa::get(&pool, id)
        .await
        .expect("get failed")
        .expect("pair missing");
    assert_eq!(pair.question, "New question?");
    assert_eq!(pair.answer, "New answer.");
    assert_eq!(pair.category.as_deref(), Some("fees"));

    let missing = qa::update(&pool, 999_999, "x", "y", None)
        .await
        .expect("update failed");
    assert!(!missing);
}

#[sqlx::test]
async fn test_delete_cascades_to_answer_and_synonyms(pool: PgPool) {
    let id = insert_qa(&pool, "Where is the campus?", "In Nungua, Accra.").await;
    qa::add_synonym(&pool, id, "campus location")
        .await
        .expect("add_synonym failed")
        .expect("question missing");

    assert!(qa::delete(&pool, id).await.expect("delete failed"));
    assert_eq!(qa::get_answer(&pool, id).await.expect("get_answer failed"), None);
    assert!(build_index(&pool).await.is_empty());
}

#[sqlx::test]
async fn test_synonym_matches_back_to_parent_answer(pool: PgPool) {
    let id = insert_qa(
        &pool,
        "How do I apply for admission?",
        "Applications are submitted through the admissions portal.",
    )
    .await;
    qa::add_synonym(&pool, id, "How can I enroll at the university?")
        .await
        .expect("add_synonym failed")
        .expect("question missing");

    let index = build_index(&pool).await;
    assert_eq!(index.len(), 2);

    // A near-verbatim synonym phrasing must resolve to the parent question.
    let m = best_match("how can i enroll at the university", index.candidates())
        .expect("expected a match via synonym");
    assert_eq!(m.question_id, id);
}

#[sqlx::test]
async fn test_fuzzy_match_tolerates_typos_but_rejects_noise(pool: PgPool) {
    let id = insert_qa(
        &pool,
        "What are the hostel fees?",
        "Hostel fees depend on the room type.",
    )
    .await;

    let index = build_index(&pool).await;

    let m = best_match("what are teh hostel fees", index.candidates())
        .expect("typo within threshold should match");
    assert_eq!(m.question_id, id);

    assert!(
        best_match("tell me a joke about penguins", index.candidates()).is_none(),
        "unrelated input must not match"
    );
}

#[sqlx::test]
async fn test_list_includes_synonyms_newest_first(pool: PgPool) {
    let first = insert_qa(&pool, "First question?", "First answer.").await;
    let second = insert_qa(&pool, "Second question?", "Second answer.").await;
    qa::add_synonym(&pool, first, "initial question")
        .await
        .expect("add_synonym failed")
        .expect("question missing");

    let pairs = qa::list(&pool).await.expect("list failed");
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[0].id, second, "newest pair first");
    let first_pair = pairs.iter().find(|p| p.id == first).expect("first missing");
    assert_eq!(first_pair.synonyms.len(), 1);
    assert_eq!(first_pair.synonyms[0].synonym, "initial question");
}
