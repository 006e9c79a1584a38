use crate::chatbot::ChatEngine;
use crate::config::Config;
use crate::email::Mailer;
use crate::llm::LlmClient;
use crate::scrape::FaqClient;
use crate::state::{AppState, QaIndex, ServiceStatus};
use crate::utils::fmt_duration;
use crate::web::auth::password::generate_password_hash;
use crate::web::auth::session::SessionCache;
use crate::web::create_router;
use anyhow::Context;
use figment::{Figment, providers::Env};
use sqlx::ConnectOptions;
use sqlx::postgres::PgPoolOptions;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

const QA_INDEX_REFRESH: Duration = Duration::from_secs(30 * 60);
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Main application struct containing all necessary components
pub struct App {
    config: Config,
    app_state: AppState,
}

impl App {
    /// Create a new App instance with all necessary components initialized
    pub async fn new() -> Result<Self, anyhow::Error> {
        // Load configuration
        let config: Config = Figment::new()
            .merge(Env::raw())
            .extract()
            .context("Failed to load config")?;

        // Create database connection pool
        let connect_options = sqlx::postgres::PgConnectOptions::from_str(&config.database_url)
            .context("Failed to parse database URL")?
            .log_statements(tracing::log::LevelFilter::Debug)
            .log_slow_statements(tracing::log::LevelFilter::Warn, Duration::from_secs(1));

        let slow_threshold = Duration::from_millis(500);
        let db_pool = PgPoolOptions::new()
            .min_connections(0)
            .max_connections(4)
            .acquire_slow_threshold(slow_threshold)
            .acquire_timeout(Duration::from_secs(4))
            .idle_timeout(Duration::from_secs(60 * 2))
            .max_lifetime(Duration::from_secs(60 * 30))
            .connect_with(connect_options)
            .await
            .context("Failed to create database pool")?;

        info!(
            min_connections = 0,
            max_connections = 4,
            acquire_timeout = "4s",
            idle_timeout = "2m",
            max_lifetime = "30m",
            acquire_slow_threshold = fmt_duration(slow_threshold),
            "database pool established"
        );

        // Run database migrations
        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .context("Failed to run database migrations")?;
        info!("Database migrations completed successfully");

        // LLM stage is optional; without an API key the pipeline falls
        // through to the scrape and fallback stages.
        let llm = match &config.llm_api_key {
            Some(key) => Some(
                LlmClient::new(config.llm_base_url.clone(), key.clone())
                    .context("Failed to create LLM client")?,
            ),
            None => {
                warn!("LLM_API_KEY not set; LLM answer stage disabled");
                None
            }
        };

        let faq = match &config.faq_url {
            Some(url) => Some(FaqClient::new(url.clone()).context("Failed to create FAQ client")?),
            None => {
                info!("FAQ_URL not set; website scrape stage disabled");
                None
            }
        };

        let mailer = match (
            &config.smtp_host,
            &config.smtp_username,
            &config.smtp_password,
            &config.smtp_from,
        ) {
            (Some(host), Some(username), Some(password), Some(from)) => Some(Arc::new(
                Mailer::new(host, username, password, from)
                    .context("Failed to configure SMTP transport")?,
            )),
            _ => {
                info!("SMTP settings incomplete; signup emails disabled");
                None
            }
        };

        let session_cache = SessionCache::new(
            db_pool.clone(),
            chrono::Duration::hours(config.session_ttl_hours),
        );

        let qa_index = Arc::new(RwLock::new(QaIndex::new()));
        let intent_model = config
            .intent_model
            .clone()
            .unwrap_or_else(|| config.chat_model.clone());

        let engine = Arc::new(ChatEngine::new(
            db_pool.clone(),
            llm.clone(),
            config.chat_model.clone(),
            intent_model,
            faq,
            qa_index.clone(),
        ));

        let app_state = AppState::new(
            db_pool.clone(),
            engine,
            qa_index,
            session_cache,
            mailer,
            config.upload_dir.clone().into(),
            config.signup_email_domain.clone(),
        );

        app_state
            .service_statuses
            .set("database", ServiceStatus::Connected);
        app_state.service_statuses.set(
            "llm",
            if llm.is_some() {
                ServiceStatus::Active
            } else {
                ServiceStatus::Disabled
            },
        );
        app_state.service_statuses.set(
            "faq_scrape",
            if config.faq_url.is_some() {
                ServiceStatus::Active
            } else {
                ServiceStatus::Disabled
            },
        );
        app_state.service_statuses.set(
            "mailer",
            if app_state.mailer.is_some() {
                ServiceStatus::Active
            } else {
                ServiceStatus::Disabled
            },
        );

        // Load the match index (may be empty on first run)
        if let Err(e) = app_state.load_qa_index().await {
            info!(error = ?e, "Could not load Q&A index on startup (may be empty)");
        }
        app_state.spawn_qa_index_refresh(QA_INDEX_REFRESH);

        Self::spawn_session_purge(&app_state);

        // Seed the initial admin account if configured
        if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
            let name = config.admin_name.as_deref().unwrap_or("Administrator");
            let password_hash = generate_password_hash(password);
            let admin =
                crate::data::admins::ensure_seed_admin(&db_pool, name, email, &password_hash)
                    .await
                    .context("Failed to seed admin account")?;
            info!(admin_id = admin.id, email = %admin.email, "Seed admin ensured");
        }

        Ok(App { config, app_state })
    }

    /// Periodically drop expired auth sessions and their conversation history.
    fn spawn_session_purge(app_state: &AppState) {
        let state = app_state.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match state.purge_expired_sessions().await {
                    Ok(0) => {}
                    Ok(n) => info!(purged = n, "Expired sessions purged"),
                    Err(e) => warn!(error = %e, "Failed to purge expired sessions"),
                }
            }
        });
    }

    /// Serve the API until a shutdown signal arrives.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let router = create_router(self.app_state.clone(), self.config.cors_origin.as_deref());

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        info!(addr = %addr, "web server listening");

        let shutdown_timeout = Duration::from_secs(self.config.shutdown_timeout);
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal(shutdown_timeout))
            .await
            .context("web server error")?;

        info!("web server stopped");
        Ok(())
    }
}

/// Resolves when SIGINT or SIGTERM arrives. Also arms a watchdog that
/// force-exits if draining outlives the configured shutdown timeout.
async fn shutdown_signal(timeout: Duration) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("SIGINT received, shutting down"),
        _ = terminate => info!("SIGTERM received, shutting down"),
    }

    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        warn!(timeout = ?timeout, "graceful shutdown timed out, exiting");
        std::process::exit(1);
    });
}
