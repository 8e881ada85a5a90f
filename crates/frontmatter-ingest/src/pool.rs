//! Bounded worker pool for batch extraction.
//!
//! Workers pull jobs from a shared queue, run the blocking
//! extract-and-parse step on tokio's blocking pool and push every report
//! into one result channel. A per-document timeout turns slow documents into
//! `Timeout` failures; cancellation stops workers from picking up new jobs
//! while in-flight documents finish.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use frontmatter_core::{BackendError, ExtractionError, ExtractionReport, SpanSource};
use frontmatter_parsing::{MetadataExtractor, canonical_identifier};

use crate::{document_identifier, process_document};

/// A document submitted to the pool.
#[derive(Debug, Clone)]
pub struct DocumentJob {
    /// Position in the submitted batch, echoed back in [`JobResult`].
    pub index: usize,
    pub path: PathBuf,
}

/// Report for one finished job.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub index: usize,
    pub path: PathBuf,
    pub report: ExtractionReport,
}

/// Number of workers used when none is configured.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// A pool of worker tasks that process documents concurrently.
///
/// Submit jobs via [`submit()`](ExtractionPool::submit); results arrive on
/// the receiver returned by [`ExtractionPool::new`] in completion order.
pub struct ExtractionPool {
    job_tx: async_channel::Sender<DocumentJob>,
    pool_handle: JoinHandle<()>,
}

impl ExtractionPool {
    /// Create a new pool with `num_workers` worker tasks.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        backend: Arc<dyn SpanSource>,
        extractor: Arc<MetadataExtractor>,
        cancel: CancellationToken,
        num_workers: usize,
        timeout: Option<Duration>,
    ) -> (Self, mpsc::UnboundedReceiver<JobResult>) {
        let (job_tx, job_rx) = async_channel::unbounded::<DocumentJob>();
        let (result_tx, result_rx) = mpsc::unbounded_channel::<JobResult>();

        let pool_handle = tokio::spawn(async move {
            let mut handles = Vec::with_capacity(num_workers.max(1));

            for _ in 0..num_workers.max(1) {
                handles.push(tokio::spawn(worker_loop(
                    job_rx.clone(),
                    backend.clone(),
                    extractor.clone(),
                    cancel.clone(),
                    result_tx.clone(),
                    timeout,
                )));
            }

            // Drop our clones so workers are the last holders
            drop(job_rx);
            drop(result_tx);

            for h in handles {
                let _ = h.await;
            }
        });

        (
            Self {
                job_tx,
                pool_handle,
            },
            result_rx,
        )
    }

    /// Get a cloneable sender for submitting jobs from multiple tasks.
    pub fn sender(&self) -> async_channel::Sender<DocumentJob> {
        self.job_tx.clone()
    }

    /// Submit a job to the pool.
    pub async fn submit(&self, job: DocumentJob) {
        let _ = self.job_tx.send(job).await;
    }

    /// Close the queue and wait for all workers to finish.
    pub async fn shutdown(self) {
        self.job_tx.close();
        let _ = self.pool_handle.await;
    }
}

async fn worker_loop(
    job_rx: async_channel::Receiver<DocumentJob>,
    backend: Arc<dyn SpanSource>,
    extractor: Arc<MetadataExtractor>,
    cancel: CancellationToken,
    result_tx: mpsc::UnboundedSender<JobResult>,
    timeout: Option<Duration>,
) {
    loop {
        let job = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            job = job_rx.recv() => match job {
                Ok(job) => job,
                Err(_) => break,
            },
        };

        let report = run_job(&job, backend.clone(), extractor.clone(), timeout).await;
        let result = JobResult {
            index: job.index,
            path: job.path,
            report,
        };
        if result_tx.send(result).is_err() {
            break;
        }
    }
}

fn failed_report(job: &DocumentJob, error: ExtractionError) -> ExtractionReport {
    let document_id = document_identifier(&job.path);
    let mut report = ExtractionReport::failed(canonical_identifier(&document_id), error);
    report.document_id = document_id;
    report
}

async fn run_job(
    job: &DocumentJob,
    backend: Arc<dyn SpanSource>,
    extractor: Arc<MetadataExtractor>,
    timeout: Option<Duration>,
) -> ExtractionReport {
    let path = job.path.clone();
    let handle =
        tokio::task::spawn_blocking(move || process_document(&*backend, &extractor, &path));

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, handle).await {
            Ok(joined) => joined,
            Err(_) => {
                tracing::warn!(path = %job.path.display(), secs = limit.as_secs(), "document timed out");
                return failed_report(
                    job,
                    ExtractionError::Timeout {
                        secs: limit.as_secs(),
                    },
                );
            }
        },
        None => handle.await,
    };

    match joined {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!(path = %job.path.display(), error = %e, "extraction task panicked");
            failed_report(
                job,
                BackendError::ExtractionError(format!("extraction task panicked: {}", e)).into(),
            )
        }
    }
}
