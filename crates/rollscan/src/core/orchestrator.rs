//! Bounded-parallel batch coordinator.
//!
//! Documents are processed on blocking worker threads under a semaphore; the
//! coordinator fans results in by completion order and is the only writer of
//! the run statistics. One document's failure never affects its siblings.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::cache::ResultCache;
use crate::core::config::SearchConfig;
use crate::core::pipeline::{DocumentTask, process_document};
use crate::error::Result;
use crate::ocr::{OcrEngine, Rasterizer};
use crate::types::{ProcessingStats, SearchResult};

/// Aggregate outcome of one batch run.
#[derive(Debug)]
pub struct BatchOutcome {
    pub results: Vec<SearchResult>,
    pub stats: ProcessingStats,
    /// True when the run was cut short by the interrupt flag. In-flight
    /// documents still ran to completion.
    pub interrupted: bool,
}

enum TaskOutput {
    /// Interrupt was set before the document started; not processed, not
    /// failed.
    Skipped,
    CacheHit(Vec<SearchResult>),
    Fresh(Vec<SearchResult>, u64),
}

/// Resolve the effective worker count.
///
/// An explicit request is clamped to `[1, cpus]`; the default leaves one
/// core for the coordinator and the OS.
pub fn resolve_worker_count(requested: Option<usize>) -> usize {
    let cpus = num_cpus::get();
    match requested {
        Some(workers) => workers.clamp(1, cpus),
        None => (cpus - 1).max(1),
    }
}

/// Search a batch of documents against the target names.
///
/// Spawns one task per document, at most `workers` running at a time, each
/// on a blocking thread. Cache hits skip the pipeline entirely and count as
/// processed files. Setting `interrupt` stops dispatch of queued documents;
/// work already running is drained, and the outcome is marked interrupted.
pub async fn process_documents(
    documents: Vec<PathBuf>,
    targets: Vec<String>,
    config: SearchConfig,
    rasterizer: Arc<dyn Rasterizer>,
    engine: Arc<dyn OcrEngine>,
    interrupt: Arc<AtomicBool>,
) -> Result<BatchOutcome> {
    let mut stats = ProcessingStats::default();
    let mut results = Vec::new();

    if documents.is_empty() {
        return Ok(BatchOutcome {
            results,
            stats,
            interrupted: interrupt.load(Ordering::SeqCst),
        });
    }

    let workers = resolve_worker_count(config.max_workers);
    tracing::info!(documents = documents.len(), workers, "starting batch");

    let targets = Arc::new(targets);
    let config = Arc::new(config);
    let semaphore = Arc::new(Semaphore::new(workers));

    let mut tasks = JoinSet::new();

    for path in documents {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let task = DocumentTask {
            path,
            targets: Arc::clone(&targets),
            config: Arc::clone(&config),
        };
        let semaphore = Arc::clone(&semaphore);
        let rasterizer = Arc::clone(&rasterizer);
        let engine = Arc::clone(&engine);
        let interrupt = Arc::clone(&interrupt);

        tasks.spawn(async move {
            // Semaphore is never closed, so acquire can only fail after
            // close; treat that as a skip.
            let Ok(_permit) = semaphore.acquire().await else {
                return (file_name, Ok(TaskOutput::Skipped));
            };

            if interrupt.load(Ordering::SeqCst) {
                return (file_name, Ok(TaskOutput::Skipped));
            }

            let output = tokio::task::spawn_blocking(move || run_task(&task, &*rasterizer, &*engine))
                .await
                .unwrap_or_else(|join_err| {
                    Err(crate::error::RollscanError::Other(format!(
                        "worker panicked: {}",
                        join_err
                    )))
                });
            (file_name, output)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (file_name, output) = match joined {
            Ok(pair) => pair,
            Err(join_err) => {
                stats.record_failure("<unknown>", format!("task panicked: {}", join_err));
                continue;
            }
        };

        match output {
            Ok(TaskOutput::Skipped) => {}
            Ok(TaskOutput::CacheHit(cached)) => {
                stats.files_processed += 1;
                stats.matches_found += cached.len() as u64;
                results.extend(cached);
            }
            Ok(TaskOutput::Fresh(fresh, pages)) => {
                stats.files_processed += 1;
                stats.pages_processed += pages;
                stats.matches_found += fresh.len() as u64;
                results.extend(fresh);
            }
            Err(e) => {
                tracing::error!(doc = %file_name, error = %e, "document failed");
                stats.record_failure(&file_name, e);
            }
        }
    }

    let interrupted = interrupt.load(Ordering::SeqCst);
    tracing::info!(
        processed = stats.files_processed,
        failed = stats.files_failed,
        matches = stats.matches_found,
        interrupted,
        "batch finished"
    );

    Ok(BatchOutcome {
        results,
        stats,
        interrupted,
    })
}

/// One worker's unit of work, on a blocking thread: consult the cache, run
/// the pipeline on a miss, store the outcome.
///
/// Each call opens its own cache handle. Keys are content-derived and writes
/// are idempotent overwrites, so concurrent workers need no locking.
fn run_task(
    task: &DocumentTask,
    rasterizer: &dyn Rasterizer,
    engine: &dyn OcrEngine,
) -> Result<TaskOutput> {
    let cache = if task.config.use_cache {
        match ResultCache::new(task.config.cache_dir.clone(), task.config.cache_ttl_days) {
            Ok(cache) => Some(cache),
            Err(e) => {
                tracing::warn!(error = %e, "cache unavailable, processing without it");
                None
            }
        }
    } else {
        None
    };

    if let Some(cache) = &cache {
        if let Some(cached) = cache.get(&task.path, &task.targets, task.config.threshold) {
            return Ok(TaskOutput::CacheHit(cached));
        }
    }

    let report = process_document(task, rasterizer, engine)?;

    if let Some(cache) = &cache {
        cache.set(
            &task.path,
            &task.targets,
            task.config.threshold,
            &report.results,
        );
    }

    Ok(TaskOutput::Fresh(report.results, report.pages_processed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_worker_count_default_leaves_headroom() {
        let cpus = num_cpus::get();
        let resolved = resolve_worker_count(None);
        assert!(resolved >= 1);
        if cpus > 1 {
            assert_eq!(resolved, cpus - 1);
        }
    }

    #[test]
    fn test_resolve_worker_count_clamps_request() {
        let cpus = num_cpus::get();
        assert_eq!(resolve_worker_count(Some(0)), 1);
        assert_eq!(resolve_worker_count(Some(cpus + 100)), cpus);
        assert_eq!(resolve_worker_count(Some(1)), 1);
    }
}
