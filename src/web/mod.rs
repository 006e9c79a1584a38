//! Web API module.

pub mod admin;
pub mod auth;
pub mod chat;
pub mod error;
pub mod feedback;
pub mod middleware;
pub mod routes;
pub mod sessions;
pub mod status;

pub use routes::*;
