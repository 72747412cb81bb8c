use autoedit_core::{AppError, ErrorMetadata, JobRecord, JobStatus};
use autoedit_processing::{Pipeline, PreparedJob, ProcessedArtifact};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, RwLock, Semaphore};
use uuid::Uuid;

type Completion = oneshot::Sender<Result<ProcessedArtifact, AppError>>;

struct QueuedJob {
    job: PreparedJob,
    done: Option<Completion>,
}

/// In-memory job status table, shared between handlers and workers
// TODO: evict terminal records after a retention window; today they live until restart.
#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<Uuid, JobRecord>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: JobRecord) {
        self.jobs.write().await.insert(record.id, record);
    }

    pub async fn get(&self, id: Uuid) -> Option<JobRecord> {
        self.jobs.read().await.get(&id).cloned()
    }

    pub async fn remove(&self, id: Uuid) {
        self.jobs.write().await.remove(&id);
    }

    async fn update(&self, id: Uuid, f: impl FnOnce(&mut JobRecord)) {
        if let Some(record) = self.jobs.write().await.get_mut(&id) {
            f(record);
            record.touch();
        }
    }

    pub async fn mark_processing(&self, id: Uuid) {
        self.update(id, |r| r.status = JobStatus::Processing).await;
    }

    pub async fn mark_completed(&self, id: Uuid, output_name: &str) {
        self.update(id, |r| {
            r.status = JobStatus::Completed;
            r.output_name = Some(output_name.to_string());
        })
        .await;
    }

    pub async fn mark_failed(&self, id: Uuid, error: &AppError) {
        let message = error.client_message();
        let code = error.error_code().to_string();
        self.update(id, |r| {
            r.status = JobStatus::Failed;
            r.error = Some(message);
            r.error_code = Some(code);
        })
        .await;
    }
}

/// Bounded queue feeding a fixed-size pool of media tool workers
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<QueuedJob>,
    registry: JobRegistry,
}

impl JobQueue {
    /// Create the queue and spawn its worker pool.
    ///
    /// At most `max_concurrent` tool runs happen at once; at most `queue_size` jobs
    /// wait behind them. Must be called inside a tokio runtime.
    pub fn new(pipeline: Arc<Pipeline>, max_concurrent: usize, queue_size: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue_size.max(1));
        let registry = JobRegistry::new();

        let worker_registry = registry.clone();
        tokio::spawn(async move {
            Self::worker_pool(rx, pipeline, worker_registry, max_concurrent.max(1)).await;
        });

        tracing::info!(
            queue_size = queue_size,
            max_concurrent = max_concurrent,
            "Job queue initialized with bounded channel"
        );

        Self { tx, registry }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Queue a job for background processing; its progress is visible in the registry.
    #[tracing::instrument(skip(self, job), fields(job_id = %job.job_id))]
    pub async fn enqueue(&self, job: PreparedJob) -> Result<(), AppError> {
        self.send(job, None).await
    }

    /// Queue a job and wait until a worker has finished it.
    #[tracing::instrument(skip(self, job), fields(job_id = %job.job_id))]
    pub async fn run(&self, job: PreparedJob) -> Result<ProcessedArtifact, AppError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.send(job, Some(done_tx)).await?;
        done_rx
            .await
            .map_err(|_| AppError::Internal("Worker dropped the job before finishing".to_string()))?
    }

    async fn send(&self, job: PreparedJob, done: Option<Completion>) -> Result<(), AppError> {
        let id = job.job_id;
        self.registry
            .insert(JobRecord::queued(id, job.original_filename.clone()))
            .await;

        match self.tx.try_send(QueuedJob { job, done }) {
            Ok(()) => {
                tracing::info!("Job enqueued");
                Ok(())
            }
            Err(e) => {
                self.registry.remove(id).await;
                match e {
                    mpsc::error::TrySendError::Full(_) => {
                        tracing::warn!("Job queue is full, rejecting job");
                        Err(AppError::QueueFull(
                            "Too many videos are being processed, please try again later"
                                .to_string(),
                        ))
                    }
                    mpsc::error::TrySendError::Closed(_) => {
                        Err(AppError::Internal("Job queue is closed".to_string()))
                    }
                }
            }
        }
    }

    async fn worker_pool(
        mut rx: mpsc::Receiver<QueuedJob>,
        pipeline: Arc<Pipeline>,
        registry: JobRegistry,
        max_concurrent: usize,
    ) {
        let semaphore = Arc::new(Semaphore::new(max_concurrent));

        while let Some(queued) = rx.recv().await {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            let pipeline = pipeline.clone();
            let registry = registry.clone();

            tokio::spawn(async move {
                let _permit = permit;
                Self::process_job(queued, pipeline, registry).await;
            });
        }

        tracing::debug!("Job queue worker pool stopped");
    }

    async fn process_job(queued: QueuedJob, pipeline: Arc<Pipeline>, registry: JobRegistry) {
        let QueuedJob { job, done } = queued;
        registry.mark_processing(job.job_id).await;

        let result = pipeline.process(&job).await;
        match &result {
            Ok(artifact) => registry.mark_completed(job.job_id, &artifact.reference).await,
            Err(e) => {
                tracing::error!(job_id = %job.job_id, error = %e, "Job processing failed");
                registry.mark_failed(job.job_id, e).await;
            }
        }

        if let Some(done) = done {
            // The waiting request may have gone away; the job result stays in the registry.
            let _ = done.send(result);
        }
    }
}
