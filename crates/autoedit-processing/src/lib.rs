//! Autoedit processing
//!
//! Upload validation, file naming, the external media tool and the pipeline that
//! ties them together.

pub mod ffmpeg;
pub mod naming;
pub mod pipeline;
pub mod validator;

pub use ffmpeg::{FfmpegArgs, FfmpegTool, MediaTool, ToolError, ToolOutput};
pub use naming::{sanitize_filename, ArtifactNames, ArtifactNaming};
pub use pipeline::{Pipeline, PreparedJob, ProcessedArtifact, RetrievedArtifact, UploadedFile};
pub use validator::{UploadValidator, ValidationError};
