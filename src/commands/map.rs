//! Map a batch of samples against a reference.
//!
//! Discovers samples in the sequence directory, builds the reference index if
//! it is missing, aligns every sample on a fixed worker pool, and writes a
//! per-sample metrics file. Steps whose outputs already exist are skipped, so
//! an interrupted batch can be resumed by running the same command again.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use log::info;

use refmap_lib::config::BatchConfig;
use refmap_lib::logging::format_duration;
use refmap_lib::metrics::{MappingMetrics, write_metrics};
use refmap_lib::pipeline::MappingPipeline;
use refmap_lib::process::SystemRunner;
use refmap_lib::sample::discover_samples;
use refmap_lib::validation::validate_dir_exists;

use crate::commands::command::Command;
use crate::commands::common::{ReferenceOptions, ThreadingOptions};

/// Map a batch of samples against a reference.
#[derive(Debug, Parser)]
#[command(
    name = "map",
    about = "\x1b[38;5;72m[MAPPING]\x1b[0m        \x1b[36mAlign a batch of samples against a reference\x1b[0m",
    long_about = r#"
Align every sample in a directory of FASTQ files against a single reference.

Read files (*.fastq, *.fq, optionally gzipped) are grouped into samples by name:
`S_R1.fastq.gz` and `S_R2.fastq.gz` form the paired-end sample `S`; a lone
`T.fq` is the single-end sample `T`.

For each sample S and analysis type A, outputs are written under PATH:
  PATH/S/A/S.bam                     aligned reads (moved to PATH/bamfiles/S.bam)
  PATH/S/A/S_sorted.bam(.bai)        with --sort, sorted and indexed reads
  PATH/S/A_bowtie_samtools.log       anything the tools wrote to stderr

Every step is skipped when its output already exists.

Example usage:
  refmap map results -s reads/ -r refs/ --sort
  refmap map results -s reads/ -r refs/ -t 16 --aligner bwa
"#
)]
pub struct Map {
    /// Output directory; must exist
    #[arg(value_name = "PATH")]
    pub output: PathBuf,

    /// Directory containing the FASTQ files
    #[arg(short = 's', long = "sequence-path")]
    pub sequence_path: PathBuf,

    #[command(flatten)]
    pub reference: ReferenceOptions,

    #[command(flatten)]
    pub threading: ThreadingOptions,

    /// Sort and index the aligned reads instead of collecting them unsorted
    #[arg(long = "sort", default_value = "false")]
    pub sort: bool,

    /// Metrics output file (default: PATH/<analysis type>_metrics.txt)
    #[arg(long = "metrics")]
    pub metrics: Option<PathBuf>,
}

impl Map {
    fn metrics_path(&self) -> PathBuf {
        self.metrics.clone().unwrap_or_else(|| {
            self.output.join(format!("{}_metrics.txt", self.reference.analysis_type))
        })
    }
}

impl Command for Map {
    fn execute(&self) -> Result<()> {
        validate_dir_exists(&self.output, "Output path")?;
        validate_dir_exists(&self.sequence_path, "Sequence path")?;
        let threads = self.threading.num_threads()?;
        let config = BatchConfig::new(
            &self.output,
            &self.reference.reference_path,
            threads,
            self.sort,
            self.reference.aligner,
            &self.reference.analysis_type,
        )?;
        let samples = discover_samples(&self.sequence_path, &self.output)?;

        info!("Starting Map");
        info!("Output: {}", self.output.display());
        info!("Reads: {} ({} sample(s))", self.sequence_path.display(), samples.len());
        info!("Reference: {}", config.reference.display());
        info!("Aligner: {}", config.aligner);
        info!("Analysis type: {}", config.analysis_type);
        info!("Threads: {threads}");
        if self.sort {
            info!("Sorting and indexing outputs");
        }

        let analysis_type = config.analysis_type.clone();
        let report = MappingPipeline::new(config, Arc::new(SystemRunner)).run(samples)?;

        let metrics_path = self.metrics_path();
        write_metrics(&metrics_path, &MappingMetrics::collect(&report.samples, &analysis_type))?;
        info!("Wrote metrics to {}", metrics_path.display());

        let stats = report.stats;
        info!(
            "Processed {} sample(s): {} aligned, {} skipped, {} indexed, {} collected, {} failed",
            stats.processed, stats.aligned, stats.skipped, stats.indexed, stats.collected, stats.failed
        );
        info!("Batch complete in {}", format_duration(report.elapsed));
        Ok(())
    }
}
