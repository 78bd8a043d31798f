//! The compression engine: runs one request through its lifecycle.

use crate::config::EngineConfig;
use crate::progress::{ProgressTracker, RequestObserver};
use crate::request::CompressionRequest;
use crate::state::{RequestState, StateMachine};
use crate::store::{CompressionResult, ResultStore, StoredArchive};
use oxipack_archive::{ContainerWriter, EntryRecord, entry_codec, write_entries};
use oxipack_core::error::{PackError, Result};
use oxipack_core::traits::Pipeline;
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Cooperative cancellation flag shared between a request and its submitter.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the request to stop at its next check.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether [`cancel`](Self::cancel) was called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// `Err(Cancelled)` once cancelled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(PackError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Runs compression requests and holds their results.
///
/// Requests are independent; they share only the worker pool and the
/// bounded [`ResultStore`].
pub struct Engine {
    config: EngineConfig,
    pool: rayon::ThreadPool,
    store: ResultStore,
}

impl Engine {
    /// Build an engine and its worker pool.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = rayon::ThreadPoolBuilder::new()
            .thread_name(|i| format!("oxipack-worker-{i}"));
        if config.workers > 0 {
            builder = builder.num_threads(config.workers);
        }
        let pool = builder
            .build()
            .map_err(|e| PackError::encoding_failure(format!("failed to start worker pool: {e}")))?;

        info!(
            workers = pool.current_num_threads(),
            max_payload_bytes = config.max_payload_bytes,
            store_capacity = config.store_capacity,
            "engine ready"
        );

        Ok(Self {
            store: ResultStore::new(config.store_capacity),
            config,
            pool,
        })
    }

    /// Engine settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Finished archives.
    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// A fresh opaque archive id.
    pub fn new_archive_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Compress under a freshly generated id.
    pub fn compress(
        &self,
        request: CompressionRequest,
        observer: &dyn RequestObserver,
        cancel: &CancelToken,
    ) -> Result<CompressionResult> {
        self.compress_as(Self::new_archive_id(), request, observer, cancel)
    }

    /// Compress under `archive_id`, publishing the archive on success.
    ///
    /// The observer sees every state change and a non-decreasing progress
    /// sequence from 0 to exactly one 100. The 100 event and
    /// [`RequestObserver::on_complete`] both arrive before `Complete`.
    /// On error the request ends in `Failed` and nothing is published.
    pub fn compress_as(
        &self,
        archive_id: String,
        request: CompressionRequest,
        observer: &dyn RequestObserver,
        cancel: &CancelToken,
    ) -> Result<CompressionResult> {
        let started = Instant::now();
        let mut machine = StateMachine::new();

        match self.run(&archive_id, &request, observer, cancel, &mut machine) {
            Ok(result) => {
                info!(
                    archive_id = %result.archive_id,
                    algorithm = %request.algorithm,
                    files = request.files.len(),
                    bytes = result.byte_size,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "request complete"
                );
                Ok(result)
            }
            Err(err) => {
                let kind = err.kind();
                if let Some(state) = machine.fail(kind) {
                    observer.on_state(state);
                }
                warn!(archive_id = %archive_id, kind = %kind, error = %err, "request failed");
                Err(err)
            }
        }
    }

    /// Remove and return a finished archive.
    pub fn retrieve(&self, archive_id: &str) -> Result<StoredArchive> {
        let archive = self.store.take(archive_id)?;
        debug!(archive_id, filename = %archive.filename, "archive retrieved");
        Ok(archive)
    }

    fn run(
        &self,
        archive_id: &str,
        request: &CompressionRequest,
        observer: &dyn RequestObserver,
        cancel: &CancelToken,
        machine: &mut StateMachine,
    ) -> Result<CompressionResult> {
        let enter = |machine: &mut StateMachine, next| -> Result<()> {
            observer.on_state(machine.transition(next)?);
            Ok(())
        };

        enter(machine, RequestState::Analyzing)?;
        let total = request.validate(self.config.max_payload_bytes)?;
        let tracker = ProgressTracker::new(observer, total, self.config.progress_step);
        tracker.start();
        debug!(
            archive_id,
            algorithm = %request.algorithm,
            level = request.level.level(),
            files = request.files.len(),
            total,
            "request analyzed"
        );

        cancel.check()?;
        enter(machine, RequestState::Encoding)?;
        let bytes = self.encode(request, &tracker, cancel)?;

        cancel.check()?;
        enter(machine, RequestState::Finalizing)?;
        let filename = request.algorithm.output_name(archive_id);
        let result = CompressionResult {
            archive_id: archive_id.to_string(),
            filename: filename.clone(),
            byte_size: bytes.len() as u64,
        };
        if let Some(evicted) = self.store.insert(archive_id, StoredArchive { filename, bytes }) {
            debug!(archive_id = %evicted, "store full, oldest archive dropped");
        }

        tracker.complete();
        observer.on_complete(&result);
        enter(machine, RequestState::Complete)?;
        Ok(result)
    }

    fn encode(
        &self,
        request: &CompressionRequest,
        tracker: &ProgressTracker<'_>,
        cancel: &CancelToken,
    ) -> Result<Vec<u8>> {
        let level = request.level;

        match request.algorithm.pipeline() {
            Pipeline::PerEntry(tag) => {
                let codec = entry_codec(tag).ok_or_else(|| {
                    PackError::encoding_failure(format!("no per-entry codec for {tag}"))
                })?;

                let records = self.pool.install(|| {
                    request
                        .files
                        .par_iter()
                        .map(|file| {
                            cancel.check()?;
                            let mut reported = 0u64;
                            let block =
                                codec.encode_with_progress(file.bytes(), level, &mut |done| {
                                    cancel.check()?;
                                    tracker.advance(done.saturating_sub(reported));
                                    reported = reported.max(done);
                                    Ok(())
                                })?;
                            tracker.advance(file.size().saturating_sub(reported));
                            Ok(EntryRecord::new(file.name(), block))
                        })
                        .collect::<Result<Vec<_>>>()
                })?;

                write_entries(&records)
            }
            Pipeline::Container(layout) => ContainerWriter::new(layout, level)
                .write_with_progress(&request.files, &mut |done| {
                    cancel.check()?;
                    tracker.set_done(done);
                    Ok(())
                }),
        }
    }
}
