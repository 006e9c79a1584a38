//! Application configuration, loaded from the environment via figment.

use serde::Deserialize;

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_shutdown_timeout() -> u64 {
    10
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_session_ttl_hours() -> i64 {
    24 * 14
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Seconds to wait for in-flight requests on shutdown.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,

    /// API key for the chat-completions backend. When unset, the LLM stage of
    /// the answer pipeline is skipped entirely.
    #[serde(default)]
    pub llm_api_key: Option<String>,

    /// Base URL of an OpenAI-compatible chat-completions API. Point this at a
    /// local inference server to run without a hosted provider.
    #[serde(default = "default_llm_base_url")]
    pub llm_base_url: String,

    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Model used for intent classification. Defaults to `chat_model`.
    #[serde(default)]
    pub intent_model: Option<String>,

    /// University FAQ endpoint used by the scrape fallback, e.g.
    /// `https://rmu.edu.gh/api/faq`. When unset, the scrape stage is skipped.
    #[serde(default)]
    pub faq_url: Option<String>,

    /// Restrict signups to this email domain (e.g. `st.rmu.edu.gh`).
    /// When unset, any email is accepted.
    #[serde(default)]
    pub signup_email_domain: Option<String>,

    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,

    /// Origin allowed for browser requests (CORS). Unset means same-origin only.
    #[serde(default)]
    pub cors_origin: Option<String>,

    // SMTP settings for the signup notification email. All four must be set
    // for mail to be sent; otherwise signup proceeds without it.
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default)]
    pub smtp_username: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
    #[serde(default)]
    pub smtp_from: Option<String>,

    // Seed admin account, ensured at startup when configured.
    #[serde(default)]
    pub admin_email: Option<String>,
    #[serde(default)]
    pub admin_password: Option<String>,
    #[serde(default)]
    pub admin_name: Option<String>,
}
