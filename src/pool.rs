//! Fixed-size worker pool that runs compression jobs.
//!
//! Jobs are drained by a dedicated rayon pool sized to the requested worker
//! count. Each job runs in isolation: a failure is recorded in that job's
//! [`JobResult`] and never stops the rest of the batch.

use crate::batch::Job;
use crate::constants::WORKER_THREAD_PREFIX;
use crate::error::{CompressionError, ErrorKind, Result};
use crate::formats::CodecFormat;
use crate::processing::CompressionBackend;
use crate::utils::calculate_compression_ratio;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::{debug, warn};

/// Outcome of one [`Job`].
#[derive(Debug)]
pub struct JobResult {
    pub job: Job,
    /// Input size in bytes, 0 if it could not be read
    pub original_size: u64,
    /// Output size in bytes, 0 on failure
    pub compressed_size: u64,
    pub error: Option<CompressionError>,
}

impl JobResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn compression_ratio(&self) -> f64 {
        if self.is_success() {
            calculate_compression_ratio(self.original_size, self.compressed_size)
        } else {
            0.0
        }
    }
}

/// Runs every job against `backend` on at most `worker_count` threads.
///
/// Returns once each job has produced exactly one [`JobResult`]. Result
/// order is not guaranteed to follow job order. An empty job list returns
/// immediately without building a pool.
pub fn execute_jobs<B>(jobs: Vec<Job>, worker_count: usize, backend: &B) -> Result<Vec<JobResult>>
where
    B: CompressionBackend + ?Sized,
{
    execute_jobs_with(jobs, worker_count, backend, |_| {})
}

/// Like [`execute_jobs`], calling `on_result` on the worker thread as soon
/// as each job finishes, whether it succeeded or not.
pub fn execute_jobs_with<B, F>(
    jobs: Vec<Job>,
    worker_count: usize,
    backend: &B,
    on_result: F,
) -> Result<Vec<JobResult>>
where
    B: CompressionBackend + ?Sized,
    F: Fn(&JobResult) + Sync,
{
    if jobs.is_empty() {
        return Ok(Vec::new());
    }

    let threads = worker_count.max(1).min(jobs.len());
    let pool = ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("{}-{}", WORKER_THREAD_PREFIX, i))
        .build()?;

    debug!(jobs = jobs.len(), threads, "starting worker pool");

    let results = pool.install(|| {
        jobs.into_par_iter()
            .map(|job| {
                let result = process_job(job, backend);
                on_result(&result);
                result
            })
            .collect()
    });

    Ok(results)
}

fn process_job<B>(job: Job, backend: &B) -> JobResult
where
    B: CompressionBackend + ?Sized,
{
    // best effort: an unreadable input still goes to the backend
    let original_size = fs::metadata(&job.input_path).map(|m| m.len()).unwrap_or(0);

    let outcome = ensure_parent_dir(&job.output_path).and_then(|()| run_backend(backend, &job));

    match outcome {
        Ok(()) => {
            let compressed_size = fs::metadata(&job.output_path).map(|m| m.len()).unwrap_or(0);
            debug!(
                input = %job.input_path.display(),
                original_size,
                compressed_size,
                "job finished"
            );
            JobResult {
                job,
                original_size,
                compressed_size,
                error: None,
            }
        }
        Err(error) => {
            warn!(input = %job.input_path.display(), %error, "job failed");
            JobResult {
                job,
                original_size,
                compressed_size: 0,
                error: Some(error),
            }
        }
    }
}

/// `create_dir_all` tolerates the directory appearing concurrently, so two
/// workers targeting the same parent are safe.
fn ensure_parent_dir(output_path: &Path) -> Result<()> {
    match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| CompressionError::OutputDirCreation {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

/// Calls the backend, tagging whatever it reports as a compression failure.
/// A panicking backend only fails its own job.
fn run_backend<B>(backend: &B, job: &Job) -> Result<()>
where
    B: CompressionBackend + ?Sized,
{
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        backend.compress(&job.input_path, &job.output_path, &job.options)
    }));

    match outcome {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) if error.kind() == ErrorKind::Compression => Err(error),
        Ok(Err(error)) => Err(CompressionError::Compression {
            format: format_label(&job.input_path),
            message: error.to_string(),
            source: Some(Box::new(error)),
        }),
        Err(payload) => Err(CompressionError::Compression {
            format: format_label(&job.input_path),
            message: format!("backend panicked: {}", panic_message(payload.as_ref())),
            source: None,
        }),
    }
}

fn format_label(input: &Path) -> String {
    CodecFormat::from_path(input)
        .map(|format| format.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}
