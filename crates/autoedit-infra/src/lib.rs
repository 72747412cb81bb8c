//! Autoedit infrastructure
//!
//! Shared pieces used by the HTTP service:
//! - Middleware (request ID)
//! - Telemetry initialization
//! - Error response body

pub mod error;
pub mod middleware;
pub mod telemetry;

pub use error::ErrorResponse;
pub use middleware::{request_id_middleware, RequestId};
pub use telemetry::init_telemetry;
