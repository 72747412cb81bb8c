//! Background job surface: submit without waiting, then poll.

use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::upload::{extract_video_field, multipart_rejection};
use autoedit_core::models::{JobAcceptedResponse, JobStatusResponse};
use autoedit_core::{AppError, JobStatus};
use autoedit_infra::ErrorResponse;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/jobs",
    tag = "jobs",
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "Form with a `video` file field"),
    responses(
        (status = 202, description = "Video accepted for processing", body = JobAcceptedResponse),
        (status = 400, description = "Missing file, unsupported format or malformed form", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 503, description = "Job queue full", body = ErrorResponse)
    )
)]
pub async fn submit_job(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<JobAcceptedResponse>), HttpAppError> {
    let multipart = multipart.map_err(multipart_rejection)?;
    let upload =
        extract_video_field(multipart, state.pipeline.validator().max_file_size()).await?;

    let job = state.pipeline.accept(upload).await?;
    let job_id = job.job_id;
    state.jobs.enqueue(job).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(JobAcceptedResponse {
            success: true,
            job_id,
            status: JobStatus::Queued,
            status_url: format!("/api/jobs/{}", job_id),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    tag = "jobs",
    params(("id" = String, Path, description = "Job ID returned on submission")),
    responses(
        (status = 200, description = "Job status", body = JobStatusResponse),
        (status = 404, description = "Unknown job", body = ErrorResponse)
    )
)]
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobStatusResponse>, HttpAppError> {
    let not_found = || AppError::NotFound(format!("Job not found: {}", id));

    let job_id = Uuid::parse_str(&id).map_err(|_| not_found())?;
    let record = state
        .jobs
        .registry()
        .get(job_id)
        .await
        .ok_or_else(not_found)?;

    Ok(Json(JobStatusResponse::from(&record)))
}
