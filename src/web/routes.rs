//! Web API router construction.

use axum::{
    Router,
    http::HeaderValue,
    response::Response,
    routing::{delete, get, post, put},
};

use std::time::Duration;

use crate::state::AppState;
use crate::web::{admin, auth, chat, feedback, sessions, status};
use crate::web::middleware::request_id::RequestIdLayer;
use axum::http::Method;
use axum::http::header::CONTENT_TYPE;
use tower_http::cors::CorsLayer;
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer};

/// Cache-Control presets.
pub mod cache {
    /// Admin and authenticated endpoints -- never cache.
    pub const ADMIN: &str = "private, no-store, must-revalidate";
}

/// Creates the web server router
pub fn create_router(app_state: AppState, cors_origin: Option<&str>) -> Router {
    let api_router = Router::new()
        .route("/health", get(status::health))
        .route("/status", get(status::status))
        .route("/chat", post(chat::chat))
        .route("/chat/reset", post(chat::reset))
        .route("/sessions", post(sessions::save).get(sessions::list))
        .route(
            "/sessions/{id}",
            get(sessions::load).delete(sessions::delete),
        )
        .route("/feedback", post(feedback::submit))
        .with_state(app_state.clone());

    let auth_router = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/guest", post(auth::guest))
        .route("/auth/admin/login", post(auth::admin_login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .with_state(app_state.clone());

    let admin_router = Router::new()
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/qa", get(admin::qa::list).post(admin::qa::create))
        .route(
            "/admin/qa/{id}",
            get(admin::qa::get)
                .put(admin::qa::update)
                .delete(admin::qa::delete),
        )
        .route("/admin/qa/{id}/synonyms", post(admin::qa::add_synonym))
        .route("/admin/qa/synonyms/{id}", delete(admin::qa::delete_synonym))
        .route(
            "/admin/memory",
            get(admin::memory::list).post(admin::memory::create),
        )
        .route(
            "/admin/memory/{id}",
            put(admin::memory::update).delete(admin::memory::delete),
        )
        .route("/admin/feedback", get(admin::feedback::list))
        .route("/admin/feedback/export", get(admin::feedback::export))
        .route("/admin/chat-history", get(admin::history::list))
        .route("/admin/chat-history/{id}", get(admin::history::get))
        .route(
            "/admin/chat-history/{id}/archive",
            post(admin::history::archive),
        )
        .route(
            "/admin/chat-history/{id}/restore",
            post(admin::history::restore),
        )
        .route(
            "/admin/datasets",
            get(admin::datasets::list).post(admin::datasets::upload),
        )
        .route(
            "/admin/datasets/{name}/preview",
            get(admin::datasets::preview),
        )
        .route(
            "/admin/datasets/{name}/import",
            post(admin::datasets::import),
        )
        .layer(axum::middleware::map_response(
            |mut resp: Response| async move {
                resp.headers_mut().insert(
                    axum::http::header::CACHE_CONTROL,
                    HeaderValue::from_static(cache::ADMIN),
                );
                resp
            },
        ))
        .with_state(app_state);

    let mut router = Router::new()
        .nest("/api", api_router)
        .nest("/api", auth_router)
        .nest("/api", admin_router);

    if let Some(origin) = cors_origin
        && let Ok(origin) = origin.parse::<HeaderValue>()
    {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([CONTENT_TYPE])
                .allow_credentials(true),
        );
    }

    router.layer((
        // Outermost: per-request ID span + severity-proportional response logging.
        RequestIdLayer,
        CompressionLayer::new()
            .zstd(true)
            .br(true)
            .gzip(true)
            .quality(tower_http::CompressionLevel::Fastest),
        TimeoutLayer::new(Duration::from_secs(60)),
    ))
}
