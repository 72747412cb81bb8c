//! HTTP error response body
//!
//! The `IntoResponse` conversion for `AppError` lives in the API crate; the orphan
//! rule keeps it out of here.

use serde::Serialize;
use utoipa::ToSchema;

/// Standard JSON error body
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    pub error: String,
    /// Stable machine-readable code, e.g. `UNSUPPORTED_FORMAT`
    pub code: String,
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>, recoverable: bool) -> Self {
        Self {
            success: false,
            error: error.into(),
            code: code.into(),
            recoverable,
            suggested_action: None,
            details: None,
            error_type: None,
        }
    }
}
