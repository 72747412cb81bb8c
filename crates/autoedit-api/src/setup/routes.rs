//! Route configuration and setup

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::state::AppState;
use autoedit_core::Config;
use autoedit_infra::request_id_middleware;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

/// Room for multipart boundaries, part headers and small text fields
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Router {
    // Server-level concurrency limit to protect against resource exhaustion under extreme load
    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(1024)
        .max(1);

    let body_limit = config
        .max_upload_size_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    tracing::info!(
        http_concurrency_limit,
        body_limit_bytes = body_limit,
        "HTTP limits configured"
    );

    Router::new()
        .route("/", get(handlers::index::index))
        .route("/upload", post(handlers::upload::upload_video))
        .route("/download/{filename}", get(handlers::download::download_video))
        .route("/api/jobs", post(handlers::jobs::submit_job))
        .route("/api/jobs/{id}", get(handlers::jobs::get_job))
        .route("/health", get(handlers::health::health_check))
        .merge(RapiDoc::with_openapi("/api/openapi.json", ApiDoc::openapi()).path("/docs"))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state)
}
