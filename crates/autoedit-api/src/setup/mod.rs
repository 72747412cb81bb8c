//! Application setup and initialization

pub mod routes;
pub mod server;
pub mod services;

use crate::state::AppState;
use anyhow::{Context, Result};
use autoedit_core::Config;
use autoedit_processing::{FfmpegArgs, FfmpegTool, MediaTool};
use std::sync::Arc;

/// Initialize telemetry, services and routes for the production binary
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config.validate().context("Configuration validation failed")?;

    autoedit_infra::init_telemetry(config.environment(), config.is_production())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!("Configuration loaded and validated successfully");

    let tool: Arc<dyn MediaTool> = Arc::new(FfmpegTool::new(
        config.ffmpeg_path(),
        FfmpegArgs {
            video_filter: config.video_filter().to_string(),
            audio_filter: config.audio_filter().to_string(),
            video_codec: config.video_codec().to_string(),
            preset: config.encode_preset().to_string(),
        },
    ));

    build_app(config, tool).await
}

/// Build state and router around an arbitrary media tool
pub async fn build_app(
    config: Config,
    tool: Arc<dyn MediaTool>,
) -> Result<(Arc<AppState>, axum::Router)> {
    let state = services::initialize_services(&config, tool).await?;
    let router = routes::setup_routes(&config, state.clone());
    Ok((state, router))
}
