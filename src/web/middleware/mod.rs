//! Tower middleware for the web server.

pub mod request_id;
