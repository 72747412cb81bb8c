use crate::error::PlainTextError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

fn content_type_for(name: &str) -> &'static str {
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "webm" => "video/webm",
        _ => "application/octet-stream",
    }
}

#[utoipa::path(
    get,
    path = "/download/{filename}",
    tag = "videos",
    params(("filename" = String, Path, description = "Processed file name from `download_url`")),
    responses(
        (status = 200, description = "Processed video as an attachment", content_type = "video/mp4"),
        (status = 404, description = "File not found", content_type = "text/plain")
    )
)]
pub async fn download_video(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, PlainTextError> {
    let artifact = state.pipeline.retrieve(&filename).await?;

    tracing::info!(
        file = %artifact.stored_name,
        size_bytes = artifact.size_bytes,
        "Serving processed video"
    );

    let disposition = format!("attachment; filename=\"{}\"", artifact.download_name);
    let mut response = Body::from_stream(ReaderStream::new(artifact.file)).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(&artifact.stored_name)),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(artifact.size_bytes));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(response)
}
