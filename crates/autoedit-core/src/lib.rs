//! Autoedit Core Library
//!
//! Configuration, error types and domain models shared by every autoedit crate.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{BaseConfig, Config, ProcessorConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{JobRecord, JobStatus};
