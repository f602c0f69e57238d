//! Fixed pool of worker threads draining a [`WorkQueue`] of samples.
//!
//! Each worker loops `get -> process -> mark_done`. Processing one item runs at
//! most three gated steps:
//!
//! 1. Align, unless the primary output or the collected copy already exists.
//! 2. In sort mode, index the sorted output if it has no `.bai` yet.
//! 3. Otherwise move the unsorted output into the collection directory.
//!
//! Failures of any step are logged and counted in [`PoolStats`]; they never stop
//! the worker and never prevent the item from being marked done.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result, bail};
use log::{debug, error, warn};

use crate::artifact::{align_gate, collect_gate, index_gate};
use crate::logging::CommandLog;
use crate::process::ProcessRunner;
use crate::progress::SampleProgress;
use crate::sample::{AnalysisResult, Sample};
use crate::tools::CommandSpec;
use crate::work_queue::WorkQueue;

/// One unit of work: a sample and the result it is to produce.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub sample: Sample,
    pub result: AnalysisResult,
}

/// Outcome counters shared by all workers.
#[derive(Debug, Default)]
pub struct PoolStats {
    processed: AtomicUsize,
    aligned: AtomicUsize,
    indexed: AtomicUsize,
    collected: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
}

/// Point-in-time copy of [`PoolStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolCounts {
    /// Items taken off the queue and finished.
    pub processed: usize,
    /// Successful alignment runs.
    pub aligned: usize,
    /// Successful `samtools index` runs.
    pub indexed: usize,
    /// Outputs moved into the collection directory.
    pub collected: usize,
    /// Items whose alignment was skipped because an output already existed.
    pub skipped: usize,
    /// Items with at least one failed step.
    pub failed: usize,
}

impl PoolStats {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> PoolCounts {
        PoolCounts {
            processed: self.processed.load(Ordering::Relaxed),
            aligned: self.aligned.load(Ordering::Relaxed),
            indexed: self.indexed.load(Ordering::Relaxed),
            collected: self.collected.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Marks the dequeued item done when dropped, including on unwind.
struct DoneGuard<'a>(&'a WorkQueue<WorkItem>);

impl Drop for DoneGuard<'_> {
    fn drop(&mut self) {
        self.0.mark_done();
    }
}

/// A fixed set of long-lived worker threads.
///
/// Dropping the pool closes the queue and joins the workers.
pub struct WorkerPool {
    queue: Arc<WorkQueue<WorkItem>>,
    stats: Arc<PoolStats>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Start `workers` threads (at least one) consuming from `queue`.
    ///
    /// # Errors
    ///
    /// Returns an error if a worker thread cannot be spawned.
    pub fn start(
        workers: usize,
        queue: Arc<WorkQueue<WorkItem>>,
        runner: Arc<dyn ProcessRunner>,
        progress: Arc<SampleProgress>,
    ) -> Result<Self> {
        let stats = Arc::new(PoolStats::default());
        let mut pool = Self { queue, stats, handles: Vec::with_capacity(workers.max(1)) };

        for id in 0..workers.max(1) {
            let queue = Arc::clone(&pool.queue);
            let stats = Arc::clone(&pool.stats);
            let runner = Arc::clone(&runner);
            let progress = Arc::clone(&progress);
            let handle = thread::Builder::new()
                .name(format!("refmap-worker-{id}"))
                .spawn(move || worker_loop(&queue, runner.as_ref(), &stats, &progress))
                .with_context(|| format!("Failed to spawn worker thread {id}"))?;
            pool.handles.push(handle);
        }
        debug!("Started {} worker(s)", pool.handles.len());
        Ok(pool)
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn stats(&self) -> PoolCounts {
        self.stats.snapshot()
    }

    /// Close the queue, wait for every worker to exit, and return the final counts.
    ///
    /// Items still buffered in the queue are processed before the workers exit.
    pub fn shutdown(mut self) -> PoolCounts {
        self.stop();
        self.stats.snapshot()
    }

    fn stop(&mut self) {
        self.queue.close();
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                error!("A worker thread panicked");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(
    queue: &WorkQueue<WorkItem>,
    runner: &dyn ProcessRunner,
    stats: &PoolStats,
    progress: &SampleProgress,
) {
    while let Some(item) = queue.get() {
        let _done = DoneGuard(queue);
        if let Err(e) = process_item(&item, runner, stats) {
            error!("Sample {}: {e:#}", item.sample.name);
            PoolStats::bump(&stats.failed);
        }
        PoolStats::bump(&stats.processed);
        progress.record(&item.sample.name);
    }
}

/// Run one command, recording its stderr in `log`. Returns whether it succeeded.
fn run_logged(runner: &dyn ProcessRunner, command: &CommandSpec, log: &CommandLog) -> bool {
    let output = runner.run(command);
    log.record(command, &output);
    if !output.success {
        warn!("Command failed (see {}): {}", log.path().display(), command);
    }
    output.success
}

/// Run the gated steps for one item.
///
/// A failed alignment ends the item: whatever it left behind is removed so the
/// next run retries the sample, and neither indexing nor collection runs.
///
/// # Errors
///
/// Returns an error if any external command fails or an output cannot be moved.
pub fn process_item(item: &WorkItem, runner: &dyn ProcessRunner, stats: &PoolStats) -> Result<()> {
    let result = &item.result;
    let name = &item.sample.name;
    let log = CommandLog::new(&result.log_path);

    if align_gate(result.primary_output(), &result.collection_path).should_run() {
        if !run_logged(runner, &result.align_command, &log) {
            remove_outputs(&result.align_command);
            bail!("alignment failed; see {}", log.path().display());
        }
        PoolStats::bump(&stats.aligned);
    } else {
        debug!("Skipping alignment for {name}: output already exists");
        PoolStats::bump(&stats.skipped);
    }

    if let Some(index_command) = &result.index_command {
        if index_gate(&result.sorted_output, &result.sorted_index).should_run() {
            if !run_logged(runner, index_command, &log) {
                bail!("indexing failed; see {}", log.path().display());
            }
            PoolStats::bump(&stats.indexed);
        }
    } else {
        fs::create_dir_all(&result.collection_dir).with_context(|| {
            format!("Failed to create collection directory {}", result.collection_dir.display())
        })?;
        if collect_gate(&result.unsorted_output, &result.collection_path).should_run() {
            move_file(&result.unsorted_output, &result.collection_path)?;
            PoolStats::bump(&stats.collected);
        }
    }

    Ok(())
}

/// Delete the declared outputs of a failed command so their gates do not treat a
/// partial file as finished work.
fn remove_outputs(command: &CommandSpec) {
    for output in command.outputs.iter().filter(|p| p.exists()) {
        match fs::remove_file(output) {
            Ok(()) => debug!("Removed partial output {}", output.display()),
            Err(e) => warn!("Failed to remove partial output {}: {e}", output.display()),
        }
    }
}

/// Move `from` to `to`, copying then removing when a rename is not possible
/// (e.g. across filesystems).
fn move_file(from: &Path, to: &Path) -> Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)
        .with_context(|| format!("Failed to copy {} to {}", from.display(), to.display()))?;
    fs::remove_file(from).with_context(|| format!("Failed to remove {}", from.display()))
}
