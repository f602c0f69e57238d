//! Batch coordinator: builds the shared index once, then fans samples out to a
//! [`WorkerPool`] through a bounded [`WorkQueue`].
//!
//! ```text
//! build index (once) -> start pool -> for each sample: derive result, put -> join -> shutdown
//! ```
//!
//! The index build happens synchronously before the first item is queued, so
//! workers only ever read the index.

use std::fmt;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};

use crate::artifact::index_present;
use crate::config::{BatchConfig, per_worker_threads};
use crate::logging::{CommandLog, OperationTimer, format_duration};
use crate::process::ProcessRunner;
use crate::progress::SampleProgress;
use crate::sample::{AnalysisResult, Sample};
use crate::work_queue::WorkQueue;
use crate::worker_pool::{PoolCounts, WorkItem, WorkerPool};

/// State of the reference index after [`MappingPipeline::build_index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    /// Already present; nothing was run.
    Present,
    /// Built by this call.
    Built,
    /// The build command failed. Details are in the index log.
    Failed,
}

impl fmt::Display for IndexStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IndexStatus::Present => "present",
            IndexStatus::Built => "built",
            IndexStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Everything a finished batch hands back to the caller.
#[derive(Debug)]
pub struct BatchReport {
    /// Samples with their results filled in for the batch's analysis type.
    pub samples: Vec<Sample>,
    pub index: IndexStatus,
    pub stats: PoolCounts,
    /// Threads given to each external process.
    pub threads_per_process: usize,
    pub elapsed: Duration,
}

/// Coordinates one batch over a fixed configuration.
pub struct MappingPipeline {
    config: Arc<BatchConfig>,
    runner: Arc<dyn ProcessRunner>,
}

impl MappingPipeline {
    #[must_use]
    pub fn new(config: BatchConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { config: Arc::new(config), runner }
    }

    #[must_use]
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Build the reference index unless one is already present.
    ///
    /// Anything the build writes to stderr is appended to the index log.
    #[must_use]
    pub fn build_index(&self) -> IndexStatus {
        let config = &self.config;
        if index_present(config.aligner, &config.reference, &config.reference_noext()) {
            debug!("Reference index for {} already present", config.reference.display());
            return IndexStatus::Present;
        }

        let timer = OperationTimer::new(&format!(
            "Building {} index for {}",
            config.aligner,
            config.reference.display()
        ));
        let command = config.tool_settings().build_command();
        let output = self.runner.run(&command);
        let log = CommandLog::new(config.index_log_path());
        log.record(&command, &output);

        if output.success {
            info!("Index built in {}", format_duration(timer.elapsed()));
            IndexStatus::Built
        } else {
            warn!("Index build failed; see {}", log.path().display());
            IndexStatus::Failed
        }
    }

    /// Map every sample and block until all of them are done.
    ///
    /// # Errors
    ///
    /// Returns an error if an output directory cannot be created or the worker
    /// pool cannot be started. Failures of individual samples are not errors;
    /// they are counted in [`BatchReport::stats`].
    pub fn run(&self, mut samples: Vec<Sample>) -> Result<BatchReport> {
        let config = &self.config;
        let timer = OperationTimer::new("Mapping samples");

        let index = self.build_index();

        let threads_per_process = per_worker_threads(config.threads, samples.len());
        let settings = config.tool_settings().with_threads(threads_per_process);
        info!(
            "Mapping {} sample(s) with {} worker(s), {} thread(s) per process",
            samples.len(),
            config.threads,
            threads_per_process
        );

        let queue = Arc::new(WorkQueue::new(config.threads));
        let progress = Arc::new(SampleProgress::new(samples.len()));
        let pool = WorkerPool::start(
            config.threads,
            Arc::clone(&queue),
            Arc::clone(&self.runner),
            Arc::clone(&progress),
        )?;

        for sample in &mut samples {
            let result =
                AnalysisResult::new(sample, &config.analysis_type, &config.output_root, &settings);
            fs::create_dir_all(&result.analysis_dir).with_context(|| {
                format!("Failed to create output directory {}", result.analysis_dir.display())
            })?;
            sample.insert_result(&config.analysis_type, result.clone());
            queue
                .put(WorkItem { sample: sample.clone(), result })
                .map_err(|item| anyhow!("Work queue closed before {} was queued", item.sample.name))?;
        }

        queue.join();
        let stats = pool.shutdown();
        timer.log_completion(samples.len());
        if stats.failed > 0 {
            warn!("{} of {} sample(s) had failures; see the per-sample logs", stats.failed, samples.len());
        }

        Ok(BatchReport { samples, index, stats, threads_per_process, elapsed: timer.elapsed() })
    }
}
