//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::handlers;
use autoedit_core::models;
use autoedit_infra::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Autoedit API",
        version = "0.1.0",
        description = "Upload a video, have it enhanced by ffmpeg (color, stabilization, loudness) and download the result."
    ),
    paths(
        handlers::upload::upload_video,
        handlers::download::download_video,
        handlers::jobs::submit_job,
        handlers::jobs::get_job,
        handlers::health::health_check,
    ),
    components(schemas(
        models::UploadResponse,
        models::JobAcceptedResponse,
        models::JobStatusResponse,
        models::JobStatus,
        ErrorResponse,
        handlers::health::HealthResponse,
    )),
    tags(
        (name = "videos", description = "Synchronous upload and download"),
        (name = "jobs", description = "Background processing with status polling"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
