//! Autoedit API Library
//!
//! HTTP handlers, the job queue and application setup.

mod api_doc;
mod handlers;
mod utils;

pub mod error;
pub mod job_queue;
pub mod setup;
pub mod state;

pub use api_doc::ApiDoc;
pub use error::HttpAppError;
pub use job_queue::{JobQueue, JobRegistry};
pub use state::AppState;
