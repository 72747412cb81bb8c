//! Application state shared by all handlers.

use crate::job_queue::JobQueue;
use autoedit_core::Config;
use autoedit_processing::Pipeline;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pipeline: Arc<Pipeline>,
    pub jobs: JobQueue,
    /// Whether the media tool answered its startup probe
    pub tool_available: bool,
}
