//! HTTP error response conversion
//!
//! Handlers return `Result<_, HttpAppError>` and use `?` on anything that converts into
//! `AppError`. The wrapper exists because of the orphan rule: `IntoResponse` and
//! `AppError` both live in other crates.

use autoedit_core::{AppError, ErrorMetadata, LogLevel};
use autoedit_infra::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Renders `AppError` as the JSON error body
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::from(err))
    }
}

/// Renders `AppError` as a plain-text body, for endpoints whose clients expect bytes
#[derive(Debug)]
pub struct PlainTextError(pub AppError);

impl From<AppError> for PlainTextError {
    fn from(err: AppError) -> Self {
        PlainTextError(err)
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

fn status_of(error: &AppError) -> StatusCode {
    StatusCode::from_u16(error.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Build the JSON body for an error, hiding details in production or for sensitive errors.
pub fn error_body(app_error: &AppError, is_production: bool) -> ErrorResponse {
    let mut body = ErrorResponse::new(
        app_error.client_message(),
        app_error.error_code(),
        app_error.is_recoverable(),
    );
    body.suggested_action = app_error.suggested_action().map(String::from);
    if !is_production && !app_error.is_sensitive() {
        body.details = Some(app_error.detailed_message());
        body.error_type = Some(app_error.error_type().to_string());
    }
    body
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;
        log_error(app_error);

        let body = error_body(app_error, is_production_env());
        (status_of(app_error), Json(body)).into_response()
    }
}

impl IntoResponse for PlainTextError {
    fn into_response(self) -> Response {
        let app_error = &self.0;
        log_error(app_error);

        (status_of(app_error), app_error.client_message()).into_response()
    }
}
