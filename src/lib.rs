//! University FAQ chatbot API server.

pub mod app;
pub mod chatbot;
pub mod cli;
pub mod config;
pub mod data;
pub mod email;
pub mod json;
pub mod llm;
pub mod logging;
pub mod scrape;
pub mod state;
pub mod utils;
pub mod web;
