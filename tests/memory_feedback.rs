//! Tests for memory corrections, feedback aggregation, and usage logs.

mod helpers;

use beacon::data::usage::{self, UsageEntry};
use beacon::data::{feedback, memory};
use helpers::insert_student;
use sqlx::PgPool;

#[sqlx::test]
async fn test_correction_matches_by_substring(pool: PgPool) {
    memory::insert(
        &pool,
        "hostel fees",
        Some("Hostel fees are 1000 cedis."),
        "Hostel fees are 1500 cedis per semester.",
    )
    .await
    .expect("insert failed");

    // The stored question appears inside the incoming message.
    let hit = memory::find_correction(&pool, "How much are the HOSTEL FEES this year?")
        .await
        .expect("lookup failed");
    assert_eq!(hit.as_deref(), Some("Hostel fees are 1500 cedis per semester."));

    let miss = memory::find_correction(&pool, "Where is the library?")
        .await
        .expect("lookup failed");
    assert_eq!(miss, None);
}

#[sqlx::test]
async fn test_correction_wildcards_are_literal(pool: PgPool) {
    // '%' and '_' in a stored question are plain text, not patterns.
    memory::insert(
        &pool,
        "100% refund",
        None,
        "Refunds are processed within 30 days.",
    )
    .await
    .expect("insert failed");

    let hit = memory::find_correction(&pool, "Can I get a 100% refund?")
        .await
        .expect("lookup failed");
    assert_eq!(hit.as_deref(), Some("Refunds are processed within 30 days."));

    // A question containing '%' must not answer unrelated messages.
    let miss = memory::find_correction(&pool, "Where is the library?")
        .await
        .expect("lookup failed");
    assert_eq!(miss, None);
}

#[sqlx::test]
async fn test_newest_correction_wins(pool: PgPool) {
    memory::insert(&pool, "registration date", None, "Registration opens in August.")
        .await
        .expect("insert failed");
    memory::insert(&pool, "registration date", None, "Registration opens in September.")
        .await
        .expect("insert failed");

    let hit = memory::find_correction(&pool, "what is the registration date")
        .await
        .expect("lookup failed");
    assert_eq!(hit.as_deref(), Some("Registration opens in September."));
}

#[sqlx::test]
async fn test_correction_update_and_delete(pool: PgPool) {
    let correction = memory::insert(&pool, "dean of students", None, "Dr. Addo")
        .await
        .expect("insert failed");

    assert!(
        memory::update(&pool, correction.id, "dean of students", "Dr. Quartey")
            .await
            .expect("update failed")
    );
    let hit = memory::find_correction(&pool, "who is the dean of students")
        .await
        .expect("lookup failed");
    assert_eq!(hit.as_deref(), Some("Dr. Quartey"));

    assert!(
        memory::delete(&pool, correction.id)
            .await
            .expect("delete failed")
    );
    assert_eq!(memory::count(&pool).await.expect("count failed"), 0);
}

#[sqlx::test]
async fn test_feedback_stats_aggregate(pool: PgPool) {
    let student = insert_student(&pool, "Akosua Darko", "akosua@st.rmu.edu.gh").await;

    feedback::insert(&pool, 5, Some("Very helpful"), Some(student.id))
        .await
        .expect("insert failed");
    feedback::insert(&pool, 3, None, None)
        .await
        .expect("insert failed");
    feedback::insert(&pool, 4, Some("Good"), None)
        .await
        .expect("insert failed");

    let stats = feedback::stats(&pool).await.expect("stats failed");
    assert_eq!(stats.total, 3);
    let avg = stats.average_rating.expect("average missing");
    assert!((avg - 4.0).abs() < 1e-9);

    let entries = feedback::list(&pool).await.expect("list failed");
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].rating, 4, "newest first");
}

#[sqlx::test]
async fn test_feedback_stats_empty(pool: PgPool) {
    let stats = feedback::stats(&pool).await.expect("stats failed");
    assert_eq!(stats.total, 0);
    assert!(stats.average_rating.is_none());
}

#[sqlx::test]
async fn test_usage_logs_and_fallback_rate(pool: PgPool) {
    usage::insert(
        &pool,
        UsageEntry {
            user_ref: "guest:abc",
            message: "what are the fees",
            intent: "fees",
            answer_source: "database",
            fallback: false,
            latency_ms: 12,
            reply: "Fees are published each semester.",
        },
    )
    .await
    .expect("insert failed");
    usage::insert(
        &pool,
        UsageEntry {
            user_ref: "student:1",
            message: "gibberish input",
            intent: "unknown",
            answer_source: "fallback",
            fallback: true,
            latency_ms: 8,
            reply: "I'm sorry, I couldn't find the answer.",
        },
    )
    .await
    .expect("insert failed");

    assert_eq!(usage::count(&pool).await.expect("count failed"), 2);
    let rate = usage::fallback_rate(&pool)
        .await
        .expect("rate failed")
        .expect("rate missing");
    assert!((rate - 0.5).abs() < 1e-9);
}
