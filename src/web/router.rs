//! Router configuration for the Web API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::WebConfig;

use super::handlers::{delete_file, list_files, login, logout, me, register, upload_files, AppState};
use super::middleware::{create_cors_layer, session_auth};

/// Create the application router.
pub fn create_router(app_state: Arc<AppState>, config: &WebConfig) -> Router {
    // Auth routes (no authentication required)
    let auth_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout));

    // File routes (authentication enforced by the AuthUser extractor)
    let file_routes = Router::new()
        .route("/", get(list_files))
        .route("/upload", post(upload_files))
        .route("/delete/*path", post(delete_file))
        .route("/me", get(me));

    let auth_state = app_state.auth.clone();
    let body_limit = usize::try_from(config.max_request_size_mb)
        .unwrap_or(usize::MAX)
        .saturating_mul(1024 * 1024);

    Router::new()
        .merge(auth_routes)
        .merge(file_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(&config.cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    let state = auth_state.clone();
                    session_auth(state, req, next)
                })),
        )
        .with_state(app_state)
        .merge(create_health_router())
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
