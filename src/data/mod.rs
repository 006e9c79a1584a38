//! Database models and query functions.

pub mod admins;
pub mod chat_sessions;
pub mod feedback;
pub mod memory;
pub mod models;
pub mod qa;
pub mod students;
pub mod uploads;
pub mod usage;
