//! Test helpers: build AppState and router around a mock media tool.
//!
//! Run from workspace root: `cargo test -p autoedit-api`.

#![allow(dead_code)]

pub mod mock_tool;

use autoedit_api::setup::build_app;
use autoedit_api::AppState;
use autoedit_core::{Config, ProcessorConfig};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub use mock_tool::MockTool;

/// Upload limit used by test apps unless overridden
pub const TEST_MAX_UPLOAD_BYTES: usize = 64 * 1024;

/// Test application: server, state, and owned scratch directories.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub tool: Arc<MockTool>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.state.config.upload_dir().clone()
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.state.config.processed_dir().clone()
    }

    /// Number of files currently in the upload directory
    pub fn uploaded_file_count(&self) -> usize {
        std::fs::read_dir(self.upload_dir())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

/// Setup a test app with isolated directories and the given tool.
pub async fn setup_test_app(tool: MockTool) -> TestApp {
    setup_test_app_with(tool, |_| {}).await
}

/// Setup a test app, letting the caller adjust the configuration first.
pub async fn setup_test_app_with(tool: MockTool, configure: impl FnOnce(&mut ProcessorConfig)) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");

    let mut config = ProcessorConfig {
        upload_dir: temp_dir.path().join("uploads"),
        processed_dir: temp_dir.path().join("processed"),
        max_upload_size_bytes: TEST_MAX_UPLOAD_BYTES,
        ..ProcessorConfig::default()
    };
    configure(&mut config);
    let config = Config::from(config);
    config.validate().expect("Test config must be valid");

    let tool = Arc::new(tool);
    let (state, router) = build_app(config, tool.clone())
        .await
        .expect("Failed to build app");

    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        state,
        tool,
        _temp_dir: temp_dir,
    }
}

/// Multipart form with a single `video` file part
pub fn video_form(file_name: &str, data: &[u8]) -> MultipartForm {
    let part = Part::bytes(data.to_vec())
        .file_name(file_name.to_string())
        .mime_type("video/mp4");
    MultipartForm::new().add_part("video", part)
}

pub async fn upload(client: &TestServer, file_name: &str, data: &[u8]) -> TestResponse {
    client
        .post("/upload")
        .multipart(video_form(file_name, data))
        .await
}
