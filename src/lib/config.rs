//! Batch configuration and reference discovery.
//!
//! A [`BatchConfig`] is built once at startup, after every input directory has
//! been validated, and is shared read-only by the coordinator and all workers.

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{RefmapError, Result};
use crate::tools::{Aligner, ToolSettings, strip_extension};
use crate::validation::{validate_analysis_type, validate_dir_exists, validate_positive};

/// Default analysis type; names the per-sample output sub-directory.
pub const DEFAULT_ANALYSIS_TYPE: &str = "referencemapping";

/// Immutable settings for one batch.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Root directory for per-sample outputs and the collection directory.
    pub output_root: PathBuf,
    /// The reference FASTA.
    pub reference: PathBuf,
    /// Worker count and total CPU budget.
    pub threads: usize,
    /// Sort + index outputs instead of collecting unsorted outputs.
    pub sort: bool,
    pub aligner: Aligner,
    pub analysis_type: String,
}

impl BatchConfig {
    /// Validate inputs and locate the reference in `reference_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory is missing, `threads` is zero, the
    /// analysis type is unusable, or the reference directory does not hold
    /// exactly one reference file.
    pub fn new(
        output_root: &Path,
        reference_dir: &Path,
        threads: usize,
        sort: bool,
        aligner: Aligner,
        analysis_type: &str,
    ) -> Result<Self> {
        validate_positive(threads, "threads")?;
        validate_analysis_type(analysis_type)?;
        let reference = find_reference(reference_dir)?;
        validate_dir_exists(output_root, "Output path")?;
        Ok(Self {
            output_root: output_root.to_path_buf(),
            reference,
            threads,
            sort,
            aligner,
            analysis_type: analysis_type.to_string(),
        })
    }

    /// Configuration for building the reference index only. Nothing is written
    /// outside the reference directory, which doubles as the output root.
    ///
    /// # Errors
    ///
    /// Same as [`BatchConfig::new`].
    pub fn for_index(
        reference_dir: &Path,
        threads: usize,
        aligner: Aligner,
        analysis_type: &str,
    ) -> Result<Self> {
        Self::new(reference_dir, reference_dir, threads, false, aligner, analysis_type)
    }

    #[must_use]
    pub fn reference_dir(&self) -> PathBuf {
        self.reference.parent().map(Path::to_path_buf).unwrap_or_default()
    }

    #[must_use]
    pub fn reference_noext(&self) -> PathBuf {
        strip_extension(&self.reference)
    }

    /// Log for the reference index build (`<reference dir>/<analysis>_<tool>_index.log`).
    #[must_use]
    pub fn index_log_path(&self) -> PathBuf {
        self.reference_dir()
            .join(format!("{}_{}_index.log", self.analysis_type, self.aligner.log_token()))
    }

    /// Tool settings using the full thread budget for a single process.
    #[must_use]
    pub fn tool_settings(&self) -> ToolSettings {
        ToolSettings::new(self.aligner, &self.reference, self.threads, self.sort)
    }
}

/// Threads given to each external process so that concurrently running
/// processes do not oversubscribe the host: `max(4, total_cpus / sample_count)`.
///
/// ```
/// use refmap_lib::config::per_worker_threads;
///
/// assert_eq!(per_worker_threads(16, 2), 8);
/// assert_eq!(per_worker_threads(8, 10), 4);
/// ```
#[must_use]
pub fn per_worker_threads(total_cpus: usize, sample_count: usize) -> usize {
    total_cpus.checked_div(sample_count).unwrap_or(total_cpus).max(4)
}

/// True for `*.fa*` reference names, optionally gzipped (`g.fa`, `g.fasta`, `g.fa.gz`).
///
/// Index side-files such as `g.fa.fai` or `g.fasta.bwt` are not references.
#[must_use]
pub fn is_reference_name(file_name: &str) -> bool {
    let name = file_name.strip_suffix(".gz").unwrap_or(file_name);
    match name.rsplit_once('.') {
        Some((stem, ext)) => !stem.is_empty() && ext.starts_with("fa") && ext != "fai",
        None => false,
    }
}

/// Locate the single reference file in `dir`.
///
/// # Errors
///
/// Returns an error if `dir` is not a directory or does not contain exactly one
/// reference file.
pub fn find_reference(dir: &Path) -> Result<PathBuf> {
    validate_dir_exists(dir, "Reference path")?;
    let missing_dir = || RefmapError::MissingDirectory {
        description: "Reference path".to_string(),
        path: dir.to_path_buf(),
    };

    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|_| missing_dir())?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| path.file_name().and_then(|n| n.to_str()).is_some_and(is_reference_name))
        .collect();
    candidates.sort();

    match candidates.len() {
        0 => Err(RefmapError::MissingReference { dir: dir.to_path_buf() }),
        1 => Ok(candidates.remove(0)),
        _ => Err(RefmapError::AmbiguousReference { dir: dir.to_path_buf(), candidates }),
    }
}
