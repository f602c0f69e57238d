//! Common CLI options shared across commands.
//!
//! These structures are composed into command structs using `#[command(flatten)]`.

use std::path::PathBuf;

use clap::Args;

use refmap_lib::config::DEFAULT_ANALYSIS_TYPE;
use refmap_lib::tools::Aligner;
use refmap_lib::validation::validate_positive;

/// Reference and aligner selection.
#[derive(Debug, Clone, Args)]
pub struct ReferenceOptions {
    /// Directory containing exactly one reference FASTA (`*.fa*`)
    #[arg(short = 'r', long = "reference-path")]
    pub reference_path: PathBuf,

    /// Aligner used to index the reference and map reads
    #[arg(long = "aligner", value_enum, default_value_t = Aligner::Bowtie2)]
    pub aligner: Aligner,

    /// Analysis type; names the per-sample output directory and log files
    #[arg(long = "analysis-type", default_value = DEFAULT_ANALYSIS_TYPE)]
    pub analysis_type: String,
}

/// Thread count for the batch.
///
/// The thread count is both the number of samples processed concurrently and
/// the total CPU budget divided among their external processes.
#[derive(Debug, Clone, Default, Args)]
pub struct ThreadingOptions {
    /// Number of threads (defaults to the number of CPUs)
    #[arg(short = 't', long = "threads")]
    pub threads: Option<usize>,
}

impl ThreadingOptions {
    /// The requested thread count, or the host CPU count.
    ///
    /// # Errors
    ///
    /// Returns an error if `--threads 0` was given.
    pub fn num_threads(&self) -> anyhow::Result<usize> {
        match self.threads {
            Some(n) => {
                validate_positive(n, "threads")?;
                Ok(n)
            }
            None => Ok(num_cpus::get().max(1)),
        }
    }
}
