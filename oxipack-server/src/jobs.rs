//! In-flight and recently finished jobs.

use dashmap::DashMap;
use oxipack_core::error::ErrorKind;
use oxipack_core::traits::Algorithm;
use oxipack_engine::{
    CancelToken, CompressionResult, ProgressEvent, RequestObserver, RequestState, ResultStore,
};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct JobProgress {
    state: RequestState,
    percent: f64,
    byte_size: Option<u64>,
    message: Option<String>,
}

/// One submitted request, observed while it runs.
#[derive(Debug)]
pub struct Job {
    archive_id: String,
    filename: String,
    algorithm: Algorithm,
    cancel: CancelToken,
    progress: Mutex<JobProgress>,
}

/// Job status as returned by `GET /jobs/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobStatus {
    /// Archive id.
    pub archive_id: String,
    /// Download name once complete.
    pub filename: String,
    /// Algorithm tag.
    pub algorithm: Algorithm,
    /// Lifecycle state name.
    pub state: &'static str,
    /// Percentage complete.
    pub progress: f64,
    /// Archive size once complete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_size: Option<u64>,
    /// Error kind if failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    /// Error message if failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Job {
    /// A pending job.
    pub fn new(archive_id: impl Into<String>, filename: impl Into<String>, algorithm: Algorithm) -> Self {
        Self {
            archive_id: archive_id.into(),
            filename: filename.into(),
            algorithm,
            cancel: CancelToken::new(),
            progress: Mutex::new(JobProgress {
                state: RequestState::Pending,
                percent: 0.0,
                byte_size: None,
                message: None,
            }),
        }
    }

    /// Archive id.
    pub fn archive_id(&self) -> &str {
        &self.archive_id
    }

    /// Cancellation handle shared with the engine.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Current state.
    pub fn state(&self) -> RequestState {
        self.lock().state
    }

    /// Record the failure message.
    pub fn fail(&self, message: impl Into<String>) {
        self.lock().message = Some(message.into());
    }

    /// Snapshot for the status endpoint.
    pub fn status(&self) -> JobStatus {
        let progress = self.lock();
        let error = match progress.state {
            RequestState::Failed(kind) => Some(kind),
            _ => None,
        };
        JobStatus {
            archive_id: self.archive_id.clone(),
            filename: self.filename.clone(),
            algorithm: self.algorithm,
            state: progress.state.name(),
            progress: progress.percent,
            byte_size: progress.byte_size,
            error,
            message: progress.message.clone(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, JobProgress> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RequestObserver for Job {
    fn on_progress(&self, event: ProgressEvent) {
        let mut progress = self.lock();
        progress.percent = progress.percent.max(event.percent);
    }

    fn on_state(&self, state: RequestState) {
        self.lock().state = state;
    }

    fn on_complete(&self, result: &CompressionResult) {
        self.lock().byte_size = Some(result.byte_size);
    }
}

/// Jobs by archive id.
///
/// Once the registry grows past its capacity it drops failed jobs and
/// completed jobs whose archive has left the store.
#[derive(Debug)]
pub struct JobRegistry {
    jobs: DashMap<String, Arc<Job>>,
    capacity: usize,
}

impl JobRegistry {
    /// Registry that starts pruning above `capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            jobs: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Track a job, pruning first if full.
    ///
    /// A completed job stays while `store` still holds its archive.
    pub fn insert(&self, job: Arc<Job>, store: &ResultStore) {
        if self.jobs.len() >= self.capacity {
            self.jobs.retain(|id, job| match job.state() {
                RequestState::Failed(_) => false,
                RequestState::Complete => store.contains(id),
                _ => true,
            });
        }
        self.jobs.insert(job.archive_id().to_string(), job);
    }

    /// Look up a job.
    pub fn get(&self, archive_id: &str) -> Option<Arc<Job>> {
        self.jobs.get(archive_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Stop tracking a job.
    pub fn remove(&self, archive_id: &str) -> Option<Arc<Job>> {
        self.jobs.remove(archive_id).map(|(_, job)| job)
    }

    /// Number of tracked jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether no jobs are tracked.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
