//! Shared helpers for integration tests.

#![allow(dead_code)]

use beacon::data::models::Student;
use beacon::data::{qa, students};
use sqlx::PgPool;

/// Insert a Q&A pair and return its question id.
pub async fn insert_qa(pool: &PgPool, question: &str, answer: &str) -> i32 {
    qa::create(pool, question, answer, None)
        .await
        .expect("failed to insert Q&A pair")
}

/// Insert a Q&A pair with a category.
pub async fn insert_qa_with_category(
    pool: &PgPool,
    question: &str,
    answer: &str,
    category: &str,
) -> i32 {
    qa::create(pool, question, answer, Some(category))
        .await
        .expect("failed to insert Q&A pair")
}

/// Create a student with a pre-hashed placeholder password.
pub async fn insert_student(pool: &PgPool, full_name: &str, email: &str) -> Student {
    students::create(pool, full_name, email, "pbkdf2:sha256:1$salt$00")
        .await
        .expect("failed to insert student")
        .expect("student email unexpectedly taken")
}
