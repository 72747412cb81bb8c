use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::upload::{extract_video_field, multipart_rejection};
use autoedit_core::models::{download_url, UploadResponse};
use autoedit_infra::ErrorResponse;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/upload",
    tag = "videos",
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "Form with a `video` file field"),
    responses(
        (status = 200, description = "Video processed", body = UploadResponse),
        (status = 400, description = "Missing file, unsupported format or malformed form", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Processing failed", body = ErrorResponse),
        (status = 503, description = "Job queue full", body = ErrorResponse)
    )
)]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let multipart = multipart.map_err(multipart_rejection)?;
    let upload =
        extract_video_field(multipart, state.pipeline.validator().max_file_size()).await?;

    let job = state.pipeline.accept(upload).await?;
    let job_id = job.job_id;
    let artifact = state.jobs.run(job).await?;

    tracing::info!(
        job_id = %job_id,
        output = %artifact.reference,
        size_bytes = artifact.size_bytes,
        "Upload processed"
    );

    Ok(Json(UploadResponse {
        success: true,
        job_id,
        download_url: download_url(&artifact.reference),
        message: "Video processed successfully".to_string(),
    }))
}
