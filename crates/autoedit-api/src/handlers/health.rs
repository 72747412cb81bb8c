//! Health check

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,
    /// `available` or `unavailable`, from the startup probe
    pub ffmpeg: String,
    /// `ok` or `missing`
    pub upload_dir: String,
    /// `ok` or `missing`
    pub processed_dir: String,
}

async fn dir_status(path: &Path) -> &'static str {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => "ok",
        _ => "missing",
    }
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 503, description = "Media tool or a storage directory unavailable", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let upload_dir = dir_status(state.pipeline.incoming().base_path()).await;
    let processed_dir = dir_status(state.pipeline.outgoing().base_path()).await;
    let healthy = state.tool_available && upload_dir == "ok" && processed_dir == "ok";

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status: if healthy { "healthy" } else { "degraded" }.to_string(),
            ffmpeg: if state.tool_available {
                "available"
            } else {
                "unavailable"
            }
            .to_string(),
            upload_dir: upload_dir.to_string(),
            processed_dir: processed_dir.to_string(),
        }),
    )
}
