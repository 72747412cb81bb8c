//! Upload pipeline: validate → persist → invoke tool → verify output → retrieve.
//!
//! [`Pipeline::accept`] covers everything up to and including the input write and is
//! cheap; [`Pipeline::process`] runs the external tool and may take minutes. Callers
//! that want the whole contract in one call use [`Pipeline::submit`].

use autoedit_core::AppError;
use autoedit_storage::{LocalStorage, StorageError};
use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs::File;
use uuid::Uuid;

use crate::ffmpeg::MediaTool;
use crate::naming::{sanitize_filename, ArtifactNaming};
use crate::validator::UploadValidator;

/// A file part as received from the client
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub data: Bytes,
}

/// An upload that passed validation and sits in the incoming directory
#[derive(Debug, Clone)]
pub struct PreparedJob {
    pub job_id: Uuid,
    pub original_filename: String,
    pub input_name: String,
    pub output_name: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Where the tool writes; renamed to `output_name` once verified
    pub staging_name: String,
    pub staging_path: PathBuf,
}

/// A verified, non-empty output in the outgoing directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedArtifact {
    pub job_id: Uuid,
    /// Name under which `retrieve` finds the artifact
    pub reference: String,
    pub size_bytes: u64,
}

/// An opened processed artifact ready to stream
#[derive(Debug)]
pub struct RetrievedArtifact {
    pub file: File,
    pub size_bytes: u64,
    /// Attachment name shown to the user
    pub download_name: String,
    /// Name on disk
    pub stored_name: String,
}

pub struct Pipeline {
    validator: UploadValidator,
    naming: ArtifactNaming,
    incoming: LocalStorage,
    outgoing: LocalStorage,
    tool: Arc<dyn MediaTool>,
}

impl Pipeline {
    pub fn new(
        validator: UploadValidator,
        naming: ArtifactNaming,
        incoming: LocalStorage,
        outgoing: LocalStorage,
        tool: Arc<dyn MediaTool>,
    ) -> Self {
        Self {
            validator,
            naming,
            incoming,
            outgoing,
            tool,
        }
    }

    pub fn validator(&self) -> &UploadValidator {
        &self.validator
    }

    pub fn incoming(&self) -> &LocalStorage {
        &self.incoming
    }

    pub fn outgoing(&self) -> &LocalStorage {
        &self.outgoing
    }

    pub fn tool(&self) -> &Arc<dyn MediaTool> {
        &self.tool
    }

    /// Validate the upload, persist it and derive the job's artifact names.
    pub async fn accept(&self, upload: UploadedFile) -> Result<PreparedJob, AppError> {
        let client_filename = self.validator.validate_presence(upload.filename.as_deref())?;
        self.validator.validate_extension(client_filename)?;
        self.validator.validate_file_size(upload.data.len())?;

        // The extension survived validation, so sanitization cannot come back empty.
        let sanitized = sanitize_filename(client_filename).ok_or_else(|| {
            AppError::UnsupportedFormat(format!("Invalid file name: {}", client_filename))
        })?;

        let job_id = Uuid::new_v4();
        let names = self.naming.derive(job_id, &sanitized);

        let input_path = self.incoming.write(&names.input_name, &upload.data).await?;
        let output_path = self.outgoing.key_to_path(&names.output_name)?;
        let staging_path = self.outgoing.key_to_path(&names.staging_name)?;

        tracing::info!(
            job_id = %job_id,
            original_filename = %client_filename,
            input = %names.input_name,
            size_bytes = upload.data.len(),
            "Upload accepted"
        );

        Ok(PreparedJob {
            job_id,
            original_filename: client_filename.to_string(),
            input_name: names.input_name,
            output_name: names.output_name,
            input_path,
            output_path,
            staging_name: names.staging_name,
            staging_path,
        })
    }

    /// Run the external tool for an accepted job and verify its output.
    ///
    /// The tool writes to the job's staging name; only a non-empty result is renamed
    /// to the output name, so `retrieve` never sees a partial or empty file.
    #[tracing::instrument(skip(self, job), fields(job_id = %job.job_id))]
    pub async fn process(&self, job: &PreparedJob) -> Result<ProcessedArtifact, AppError> {
        let start = std::time::Instant::now();
        tracing::info!(input = %job.input_name, output = %job.output_name, "Starting media tool");

        let size_bytes = match self.run_tool(job).await {
            Ok(size_bytes) => size_bytes,
            Err(e) => {
                if let Err(delete_err) = self.outgoing.delete(&job.staging_name).await {
                    tracing::debug!(
                        error = %delete_err,
                        staging = %job.staging_name,
                        "Failed to remove partial output"
                    );
                }
                return Err(e);
            }
        };

        tracing::info!(
            size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Processed artifact ready"
        );

        Ok(ProcessedArtifact {
            job_id: job.job_id,
            reference: job.output_name.clone(),
            size_bytes,
        })
    }

    async fn run_tool(&self, job: &PreparedJob) -> Result<u64, AppError> {
        let output = self
            .tool
            .run(&job.input_path, &job.staging_path)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        if !output.success {
            tracing::warn!(
                exit_code = ?output.exit_code,
                stderr = %output.stderr,
                "Media tool reported failure"
            );
            return Err(AppError::ExternalTool {
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }

        let size_bytes = match self.outgoing.content_length(&job.staging_name).await {
            Ok(size) => size,
            Err(StorageError::NotFound(_)) => 0,
            Err(e) => return Err(e.into()),
        };
        if size_bytes == 0 {
            return Err(AppError::OutputMissing(
                "Processing finished but no output file was produced".to_string(),
            ));
        }

        self.outgoing
            .rename(&job.staging_name, &job.output_name)
            .await?;
        Ok(size_bytes)
    }

    /// Full upload contract: accept then process.
    pub async fn submit(&self, upload: UploadedFile) -> Result<ProcessedArtifact, AppError> {
        let job = self.accept(upload).await?;
        self.process(&job).await
    }

    /// Resolve a download reference in the outgoing directory.
    ///
    /// The reference is sanitized exactly like an upload name; anything that does not
    /// resolve to an existing non-empty file is `NotFound`.
    pub async fn retrieve(&self, reference: &str) -> Result<RetrievedArtifact, AppError> {
        let not_found = || AppError::NotFound("File not found".to_string());

        let stored_name = sanitize_filename(reference).ok_or_else(not_found)?;
        let (file, size_bytes) = match self.outgoing.open(&stored_name).await {
            Ok(opened) => opened,
            Err(StorageError::NotFound(_)) | Err(StorageError::InvalidKey(_)) => {
                return Err(not_found());
            }
            Err(e) => return Err(e.into()),
        };
        if size_bytes == 0 {
            return Err(not_found());
        }

        Ok(RetrievedArtifact {
            file,
            size_bytes,
            download_name: self.naming.download_name(&stored_name),
            stored_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffmpeg::{ToolError, ToolOutput};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    enum Behavior {
        Succeed(Vec<u8>),
        Fail(&'static str),
        FailWithPartial(&'static str),
        NoOutput,
        EmptyOutput,
    }

    struct ScriptedTool {
        behavior: Behavior,
        calls: AtomicUsize,
    }

    impl ScriptedTool {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl MediaTool for ScriptedTool {
        async fn run(&self, input: &Path, output: &Path) -> Result<ToolOutput, ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(input.exists(), "input must be persisted before the tool runs");
            let ok = |stderr: &str| ToolOutput {
                success: true,
                exit_code: Some(0),
                stderr: stderr.to_string(),
            };
            let failed = |stderr: &str| ToolOutput {
                success: false,
                exit_code: Some(1),
                stderr: stderr.to_string(),
            };
            match &self.behavior {
                Behavior::Succeed(bytes) => {
                    tokio::fs::write(output, bytes).await.unwrap();
                    Ok(ok(""))
                }
                Behavior::Fail(stderr) => Ok(failed(*stderr)),
                Behavior::FailWithPartial(stderr) => {
                    tokio::fs::write(output, b"partial").await.unwrap();
                    Ok(failed(*stderr))
                }
                Behavior::NoOutput => Ok(ok("")),
                Behavior::EmptyOutput => {
                    tokio::fs::write(output, b"").await.unwrap();
                    Ok(ok(""))
                }
            }
        }

        async fn probe(&self) -> bool {
            true
        }
    }

    struct Fixture {
        _dir: TempDir,
        pipeline: Pipeline,
        tool: Arc<ScriptedTool>,
    }

    async fn fixture(behavior: Behavior) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let incoming = LocalStorage::new(dir.path().join("uploads")).await.unwrap();
        let outgoing = LocalStorage::new(dir.path().join("processed")).await.unwrap();
        let tool = ScriptedTool::new(behavior);
        let pipeline = Pipeline::new(
            UploadValidator::new(1024, vec!["mp4".into(), "mov".into(), "avi".into(), "mkv".into()]),
            ArtifactNaming::new("processed_", "mp4", "edited_"),
            incoming,
            outgoing,
            tool.clone(),
        );
        Fixture {
            _dir: dir,
            pipeline,
            tool,
        }
    }

    fn upload(name: Option<&str>, data: &[u8]) -> UploadedFile {
        UploadedFile {
            filename: name.map(str::to_string),
            data: Bytes::copy_from_slice(data),
        }
    }

    fn dir_is_empty(path: &Path) -> bool {
        std::fs::read_dir(path).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn test_submit_end_to_end() {
        let f = fixture(Behavior::Succeed(b"processed video".to_vec())).await;
        let artifact = f
            .pipeline
            .submit(upload(Some("clip.mp4"), b"raw video"))
            .await
            .unwrap();

        assert_eq!(
            artifact.reference,
            format!("processed_{}_clip.mp4", artifact.job_id)
        );
        assert_eq!(artifact.size_bytes, 15);

        let mut retrieved = f.pipeline.retrieve(&artifact.reference).await.unwrap();
        assert_eq!(retrieved.download_name, "edited_clip.mp4");
        let mut bytes = Vec::new();
        retrieved.file.read_to_end(&mut bytes).await.unwrap();
        assert_eq!(bytes, b"processed video");
    }

    #[tokio::test]
    async fn test_missing_file_never_persists() {
        let f = fixture(Behavior::NoOutput).await;
        for name in [None, Some("")] {
            let err = f.pipeline.submit(upload(name, b"data")).await.unwrap_err();
            assert!(matches!(err, AppError::MissingFile(_)));
        }
        assert!(dir_is_empty(f.pipeline.incoming().base_path()));
        assert_eq!(f.tool.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unsupported_extension_writes_nothing() {
        let f = fixture(Behavior::NoOutput).await;
        for name in ["notes.txt", "clip", "clip.mp4.exe"] {
            let err = f
                .pipeline
                .submit(upload(Some(name), b"data"))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::UnsupportedFormat(_)), "{}", name);
        }
        assert!(dir_is_empty(f.pipeline.incoming().base_path()));
        assert_eq!(f.tool.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_extension_check_is_case_insensitive() {
        let f = fixture(Behavior::Succeed(b"out".to_vec())).await;
        let artifact = f
            .pipeline
            .submit(upload(Some("HOLIDAY.MKV"), b"raw"))
            .await
            .unwrap();
        assert!(artifact.reference.ends_with("_HOLIDAY.mp4"));
    }

    #[tokio::test]
    async fn test_oversized_upload_writes_nothing() {
        let f = fixture(Behavior::NoOutput).await;
        let err = f
            .pipeline
            .submit(upload(Some("clip.mp4"), &[0u8; 2048]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));
        assert!(dir_is_empty(f.pipeline.incoming().base_path()));
    }

    #[tokio::test]
    async fn test_tool_failure_surfaces_stderr_and_cleans_partial_output() {
        let f = fixture(Behavior::FailWithPartial("moov atom not found")).await;
        let job = f
            .pipeline
            .accept(upload(Some("clip.mp4"), b"raw"))
            .await
            .unwrap();
        let err = f.pipeline.process(&job).await.unwrap_err();
        match err {
            AppError::ExternalTool { exit_code, stderr } => {
                assert_eq!(exit_code, Some(1));
                assert_eq!(stderr, "moov atom not found");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!job.output_path.exists());
        assert!(!job.staging_path.exists());
        // Inputs stay in place
        assert!(job.input_path.exists());
    }

    #[tokio::test]
    async fn test_tool_failure_without_output() {
        let f = fixture(Behavior::Fail("Invalid data found when processing input")).await;
        let err = f
            .pipeline
            .submit(upload(Some("clip.mp4"), b"raw"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ExternalTool { .. }));
    }

    #[tokio::test]
    async fn test_success_without_output_is_output_missing() {
        let f = fixture(Behavior::NoOutput).await;
        let err = f
            .pipeline
            .submit(upload(Some("clip.mp4"), b"raw"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::OutputMissing(_)));
    }

    #[tokio::test]
    async fn test_empty_output_is_output_missing() {
        let f = fixture(Behavior::EmptyOutput).await;
        let job = f
            .pipeline
            .accept(upload(Some("clip.mp4"), b"raw"))
            .await
            .unwrap();
        let err = f.pipeline.process(&job).await.unwrap_err();
        assert!(matches!(err, AppError::OutputMissing(_)));

        // Nothing is left behind for a download to find
        assert!(dir_is_empty(f.pipeline.outgoing().base_path()));
        let err = f.pipeline.retrieve(&job.output_name).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_tool_writes_to_staging_name() {
        let f = fixture(Behavior::Succeed(b"out".to_vec())).await;
        let job = f
            .pipeline
            .accept(upload(Some("clip.mp4"), b"raw"))
            .await
            .unwrap();
        assert_ne!(job.staging_path, job.output_path);
        assert!(job.staging_path.starts_with(f.pipeline.outgoing().base_path()));

        // An output still being written is not downloadable under either name
        std::fs::write(&job.staging_path, b"half a video").unwrap();
        for reference in [&job.output_name, &job.staging_name] {
            let err = f.pipeline.retrieve(reference).await.unwrap_err();
            assert!(matches!(err, AppError::NotFound(_)), "{}", reference);
        }

        let artifact = f.pipeline.process(&job).await.unwrap();
        assert_eq!(artifact.reference, job.output_name);
        assert!(job.output_path.is_file());
        assert!(!job.staging_path.exists());
        assert!(f.pipeline.retrieve(&job.output_name).await.is_ok());
    }

    #[tokio::test]
    async fn test_retrieve_empty_file_is_not_found() {
        let f = fixture(Behavior::NoOutput).await;
        let name = format!("processed_{}_clip.mp4", Uuid::nil());
        f.pipeline.outgoing().write(&name, b"").await.unwrap();

        let err = f.pipeline.retrieve(&name).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_long_file_name_is_accepted() {
        let f = fixture(Behavior::Succeed(b"out".to_vec())).await;
        let name = format!("{}.mp4", "a".repeat(300));
        let artifact = f
            .pipeline
            .submit(upload(Some(&name), b"raw"))
            .await
            .unwrap();

        assert!(artifact.reference.len() <= 255);
        assert!(artifact.reference.ends_with("a.mp4"));
        let retrieved = f.pipeline.retrieve(&artifact.reference).await.unwrap();
        assert!(retrieved.download_name.starts_with("edited_aaa"));
        assert!(retrieved.download_name.ends_with(".mp4"));
    }

    #[tokio::test]
    async fn test_traversal_names_stay_inside_incoming() {
        let f = fixture(Behavior::Succeed(b"out".to_vec())).await;
        let job = f
            .pipeline
            .accept(upload(Some("../../../../tmp/evil.mp4"), b"raw"))
            .await
            .unwrap();
        assert!(job.input_path.starts_with(f.pipeline.incoming().base_path()));
        assert!(job.output_path.starts_with(f.pipeline.outgoing().base_path()));
        assert_eq!(job.input_name, format!("{}_evil.mp4", job.job_id));
        assert_eq!(job.original_filename, "../../../../tmp/evil.mp4");
    }

    #[tokio::test]
    async fn test_same_name_uploads_do_not_collide() {
        let f = fixture(Behavior::Succeed(b"out".to_vec())).await;
        let first = f.pipeline.accept(upload(Some("clip.mp4"), b"one")).await.unwrap();
        let second = f.pipeline.accept(upload(Some("clip.mp4"), b"two")).await.unwrap();
        assert_ne!(first.input_path, second.input_path);
        assert_ne!(first.output_path, second.output_path);
        assert_eq!(std::fs::read(&first.input_path).unwrap(), b"one");
        assert_eq!(std::fs::read(&second.input_path).unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_retrieve_unknown_reference_is_not_found() {
        let f = fixture(Behavior::NoOutput).await;
        for reference in ["processed_nothing.mp4", "..", "../uploads/x.mp4", ""] {
            let err = f.pipeline.retrieve(reference).await.unwrap_err();
            assert!(matches!(err, AppError::NotFound(_)), "{:?}", reference);
        }
    }

    #[tokio::test]
    async fn test_retrieve_cannot_reach_incoming_directory() {
        let f = fixture(Behavior::Succeed(b"out".to_vec())).await;
        let job = f
            .pipeline
            .accept(upload(Some("clip.mp4"), b"raw"))
            .await
            .unwrap();
        let sneaky = format!("../uploads/{}", job.input_name);
        // Sanitization reduces this to the bare input name, which does not exist in outgoing.
        let err = f.pipeline.retrieve(&sneaky).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
