//! External media tool invocation.
//!
//! The pipeline only knows the [`MediaTool`] contract: an input path, an output path,
//! an exit status and stderr. [`FfmpegTool`] is the production implementation.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Outcome of one tool run
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stderr: String,
}

/// The tool could not be run at all (as opposed to running and failing)
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// A media processor that turns the file at `input` into a file at `output`
#[async_trait]
pub trait MediaTool: Send + Sync {
    async fn run(&self, input: &Path, output: &Path) -> Result<ToolOutput, ToolError>;

    /// Whether the tool answers at all; used for startup and health reporting
    async fn probe(&self) -> bool;
}

/// Fixed processing arguments passed on every invocation
#[derive(Debug, Clone)]
pub struct FfmpegArgs {
    pub video_filter: String,
    pub audio_filter: String,
    pub video_codec: String,
    pub preset: String,
}

impl FfmpegArgs {
    /// `-y -i <input> -vf <filter> -af <filter> -c:v <codec> -preset <preset> <output>`
    pub fn build(&self, input: &Path, output: &Path) -> Vec<OsString> {
        vec![
            "-y".into(),
            "-i".into(),
            input.as_os_str().to_owned(),
            "-vf".into(),
            self.video_filter.as_str().into(),
            "-af".into(),
            self.audio_filter.as_str().into(),
            "-c:v".into(),
            self.video_codec.as_str().into(),
            "-preset".into(),
            self.preset.as_str().into(),
            output.as_os_str().to_owned(),
        ]
    }
}

/// Runs ffmpeg as a child process per invocation
#[derive(Debug, Clone)]
pub struct FfmpegTool {
    program: String,
    args: FfmpegArgs,
}

impl FfmpegTool {
    pub fn new(program: impl Into<String>, args: FfmpegArgs) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl MediaTool for FfmpegTool {
    #[tracing::instrument(skip(self))]
    async fn run(&self, input: &Path, output: &Path) -> Result<ToolOutput, ToolError> {
        let start = std::time::Instant::now();

        // No timeout: the run lasts as long as the tool needs.
        let result = Command::new(&self.program)
            .args(self.args.build(input, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| ToolError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();

        tracing::info!(
            program = %self.program,
            exit_code = ?result.status.code(),
            success = result.status.success(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Media tool finished"
        );

        Ok(ToolOutput {
            success: result.status.success(),
            exit_code: result.status.code(),
            stderr,
        })
    }

    async fn probe(&self) -> bool {
        match Command::new(&self.program)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
        {
            Ok(status) => status.success(),
            Err(e) => {
                tracing::debug!(program = %self.program, error = %e, "Media tool probe failed");
                false
            }
        }
    }
}
