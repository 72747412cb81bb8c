//! Common utilities for upload handlers

use autoedit_core::AppError;
use autoedit_processing::UploadedFile;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::Multipart;
use axum::http::StatusCode;
use bytes::BytesMut;

/// Name of the form field carrying the video
pub const VIDEO_FIELD: &str = "video";

fn too_large(max_size: usize) -> AppError {
    AppError::PayloadTooLarge(format!(
        "File size exceeds maximum allowed size of {} MB",
        max_size / 1024 / 1024
    ))
}

fn multipart_error(err: MultipartError, max_size: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large(max_size)
    } else {
        AppError::InvalidInput(format!("Failed to read multipart: {}", err.body_text()))
    }
}

/// A request that is not multipart at all carries no file part.
pub fn multipart_rejection(rejection: MultipartRejection) -> AppError {
    AppError::MissingFile(format!("No video file provided: {}", rejection.body_text()))
}

/// Read the `video` field from a multipart form.
///
/// Other fields are skipped without buffering. The file is read chunk by chunk and
/// abandoned as soon as it grows past `max_size`, so nothing oversized is ever held
/// in full or written anywhere.
pub async fn extract_video_field(
    mut multipart: Multipart,
    max_size: usize,
) -> Result<UploadedFile, AppError> {
    let mut upload: Option<UploadedFile> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_size))?
    {
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }

        if upload.is_some() {
            return Err(AppError::InvalidInput(
                "Multiple video fields are not allowed; send exactly one field named 'video'"
                    .to_string(),
            ));
        }

        let filename = field.file_name().map(|s| s.to_string());
        let mut data = BytesMut::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| multipart_error(e, max_size))?
        {
            if data.len() + chunk.len() > max_size {
                tracing::debug!(max_size, "Upload exceeded size limit while streaming");
                return Err(too_large(max_size));
            }
            data.extend_from_slice(&chunk);
        }

        upload = Some(UploadedFile {
            filename,
            data: data.freeze(),
        });
    }

    upload.ok_or_else(|| AppError::MissingFile("No video file provided".to_string()))
}
