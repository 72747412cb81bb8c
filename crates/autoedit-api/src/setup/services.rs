//! Service initialization

use crate::job_queue::JobQueue;
use crate::state::AppState;
use anyhow::{Context, Result};
use autoedit_core::Config;
use autoedit_processing::{ArtifactNaming, MediaTool, Pipeline, UploadValidator};
use autoedit_storage::LocalStorage;
use std::sync::Arc;

/// Create the storage directories, probe the media tool and start the job queue
pub async fn initialize_services(config: &Config, tool: Arc<dyn MediaTool>) -> Result<Arc<AppState>> {
    let incoming = LocalStorage::new(config.upload_dir())
        .await
        .context("Failed to prepare upload directory")?;
    let outgoing = LocalStorage::new(config.processed_dir())
        .await
        .context("Failed to prepare processed directory")?;

    tracing::info!(
        upload_dir = %incoming.base_path().display(),
        processed_dir = %outgoing.base_path().display(),
        "Storage directories ready"
    );

    let tool_available = tool.probe().await;
    if tool_available {
        tracing::info!(ffmpeg_path = %config.ffmpeg_path(), "Media tool available");
    } else {
        tracing::warn!(
            ffmpeg_path = %config.ffmpeg_path(),
            "Media tool did not answer its probe; uploads will fail until it is installed"
        );
    }

    let pipeline = Arc::new(Pipeline::new(
        UploadValidator::new(
            config.max_upload_size_bytes(),
            config.allowed_extensions().to_vec(),
        ),
        ArtifactNaming::new(
            config.output_prefix(),
            config.output_extension(),
            config.download_prefix(),
        ),
        incoming,
        outgoing,
        tool,
    ));

    let jobs = JobQueue::new(
        pipeline.clone(),
        config.max_concurrent_jobs(),
        config.job_queue_size(),
    );

    Ok(Arc::new(AppState {
        config: config.clone(),
        pipeline,
        jobs,
        tool_available,
    }))
}
