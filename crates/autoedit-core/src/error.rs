//! Error types module
//!
//! All pipeline failures are unified under the `AppError` enum. Each variant maps to a
//! stable machine-readable code and HTTP status through the `ErrorMetadata` trait, so
//! request boundaries can render them without knowing which stage produced them.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like a saturated job queue
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "UNSUPPORTED_FORMAT")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (resubmitting may succeed)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Missing file: {0}")]
    MissingFile(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("External tool failed: {stderr}")]
    ExternalTool {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Output missing: {0}")]
    OutputMissing(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Job queue full: {0}")]
    QueueFull(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::MissingFile(_) => (
            400,
            "MISSING_FILE",
            false,
            Some("Attach a video file in the 'video' form field"),
            false,
            LogLevel::Debug,
        ),
        AppError::UnsupportedFormat(_) => (
            400,
            "UNSUPPORTED_FORMAT",
            false,
            Some("Upload a file with one of the allowed extensions"),
            false,
            LogLevel::Debug,
        ),
        AppError::PayloadTooLarge(_) => (
            413,
            "PAYLOAD_TOO_LARGE",
            false,
            Some("Reduce file size and upload again"),
            false,
            LogLevel::Debug,
        ),
        AppError::ExternalTool { .. } => (
            500,
            "EXTERNAL_TOOL_ERROR",
            false,
            Some("Check that the file is a valid video and resubmit"),
            false,
            LogLevel::Error,
        ),
        AppError::OutputMissing(_) => (
            500,
            "OUTPUT_MISSING",
            true,
            Some("Resubmit the video"),
            false,
            LogLevel::Error,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the file name or job ID"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request format and parameters"),
            false,
            LogLevel::Debug,
        ),
        AppError::QueueFull(_) => (
            503,
            "QUEUE_FULL",
            true,
            Some("Wait a few seconds and retry"),
            false,
            LogLevel::Warn,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::MissingFile(_) => "MissingFile",
            AppError::UnsupportedFormat(_) => "UnsupportedFormat",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::ExternalTool { .. } => "ExternalToolError",
            AppError::OutputMissing(_) => "OutputMissing",
            AppError::NotFound(_) => "NotFound",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::QueueFull(_) => "QueueFull",
            AppError::Internal(_) => "InternalError",
            AppError::InternalWithSource { .. } => "InternalError",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::MissingFile(ref msg) => msg.clone(),
            AppError::UnsupportedFormat(ref msg) => msg.clone(),
            AppError::PayloadTooLarge(ref msg) => msg.clone(),
            // stderr is surfaced verbatim
            AppError::ExternalTool { stderr, .. } => {
                format!("Video processing failed: {}", stderr)
            }
            AppError::OutputMissing(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::QueueFull(ref msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_validation_kinds() {
        let err = AppError::MissingFile("No video file provided".to_string());
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "MISSING_FILE");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "No video file provided");
        assert_eq!(err.log_level(), LogLevel::Debug);

        let err = AppError::UnsupportedFormat("gif".to_string());
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "UNSUPPORTED_FORMAT");

        let err = AppError::PayloadTooLarge("too big".to_string());
        assert_eq!(err.http_status_code(), 413);
        assert_eq!(err.error_code(), "PAYLOAD_TOO_LARGE");
    }

    #[test]
    fn test_error_metadata_external_tool_carries_stderr() {
        let err = AppError::ExternalTool {
            exit_code: Some(1),
            stderr: "clip.mp4: Invalid data found when processing input".to_string(),
        };
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "EXTERNAL_TOOL_ERROR");
        assert!(err
            .client_message()
            .contains("Invalid data found when processing input"));
        assert!(!err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_error_metadata_output_missing() {
        let err = AppError::OutputMissing("no output".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "OUTPUT_MISSING");
        assert_eq!(err.error_type(), "OutputMissing");
    }

    #[test]
    fn test_error_metadata_not_found() {
        let err = AppError::NotFound("File not found".to_string());
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "File not found");
    }

    #[test]
    fn test_internal_errors_are_sensitive() {
        let err = AppError::from(anyhow::anyhow!("disk exploded"));
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
        assert!(err.is_sensitive());
        assert_eq!(err.client_message(), "Internal server error");
        assert!(err.detailed_message().contains("disk exploded"));

        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = AppError::from(io_err);
        assert_eq!(err.error_type(), "InternalError");
    }

    #[test]
    fn test_queue_full_is_recoverable() {
        let err = AppError::QueueFull("busy".to_string());
        assert_eq!(err.http_status_code(), 503);
        assert!(err.is_recoverable());
        assert_eq!(err.suggested_action(), Some("Wait a few seconds and retry"));
        assert_eq!(err.log_level(), LogLevel::Warn);
    }
}
