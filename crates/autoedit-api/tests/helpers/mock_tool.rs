//! Scripted stand-in for ffmpeg.

use async_trait::async_trait;
use autoedit_processing::{MediaTool, ToolError, ToolOutput};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Prefix the mock writes in front of the input bytes
pub const EDITED_MARKER: &[u8] = b"edited:";

#[derive(Debug, Clone)]
pub enum Behavior {
    /// Write `EDITED_MARKER` followed by the input bytes
    Succeed,
    /// Exit 1 with the given stderr, leaving a partial output behind
    Fail(String),
    /// Exit 0 without writing anything
    NoOutput,
    /// Exit 0 after creating an empty output
    EmptyOutput,
}

#[derive(Debug)]
pub struct MockTool {
    behavior: Behavior,
    available: bool,
    calls: AtomicUsize,
}

impl MockTool {
    pub fn succeeding() -> Self {
        Self::new(Behavior::Succeed)
    }

    pub fn failing(stderr: &str) -> Self {
        Self::new(Behavior::Fail(stderr.to_string()))
    }

    pub fn silent() -> Self {
        Self::new(Behavior::NoOutput)
    }

    pub fn empty() -> Self {
        Self::new(Behavior::EmptyOutput)
    }

    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            available: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// Probe reports the tool as missing
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaTool for MockTool {
    async fn run(&self, input: &Path, output: &Path) -> Result<ToolOutput, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Succeed => {
                let mut data = EDITED_MARKER.to_vec();
                data.extend(tokio::fs::read(input).await.expect("input must exist"));
                tokio::fs::write(output, data).await.expect("write output");
                Ok(ToolOutput {
                    success: true,
                    exit_code: Some(0),
                    stderr: String::new(),
                })
            }
            Behavior::Fail(stderr) => {
                tokio::fs::write(output, b"partial").await.expect("write partial");
                Ok(ToolOutput {
                    success: false,
                    exit_code: Some(1),
                    stderr: stderr.clone(),
                })
            }
            Behavior::NoOutput => Ok(ToolOutput {
                success: true,
                exit_code: Some(0),
                stderr: String::new(),
            }),
            Behavior::EmptyOutput => {
                tokio::fs::write(output, b"").await.expect("write empty output");
                Ok(ToolOutput {
                    success: true,
                    exit_code: Some(0),
                    stderr: String::new(),
                })
            }
        }
    }

    async fn probe(&self) -> bool {
        self.available
    }
}
