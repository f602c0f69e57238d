//! Per-sample mapping metrics written as TSV after a batch.

use std::path::Path;

use anyhow::{Context, Result};
use fgoxide::io::DelimFile;
use serde::{Deserialize, Serialize};

use crate::artifact::all_exist;
use crate::sample::Sample;

/// One row of the mapping metrics file.
///
/// Existence columns are evaluated when the row is built, after the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingMetrics {
    pub sample: String,
    pub analysis_type: String,
    pub paired: bool,
    /// Sorted output in sort mode, unsorted output otherwise.
    pub primary_output: String,
    pub primary_output_exists: bool,
    /// Sorted output and its `.bai` both present (always false outside sort mode).
    pub index_exists: bool,
    /// Output present in the collection directory.
    pub collected: bool,
}

impl MappingMetrics {
    /// Build the row for `sample`, or `None` if it has no result for `analysis_type`.
    #[must_use]
    pub fn for_sample(sample: &Sample, analysis_type: &str) -> Option<Self> {
        let result = sample.result(analysis_type)?;
        Some(Self {
            sample: sample.name.clone(),
            analysis_type: analysis_type.to_string(),
            paired: sample.is_paired(),
            primary_output: result.primary_output().display().to_string(),
            primary_output_exists: result.primary_output().exists(),
            index_exists: result.is_sorted() && all_exist(&[&result.sorted_output, &result.sorted_index]),
            collected: result.collection_path.exists(),
        })
    }

    /// Rows for every sample that carries a result for `analysis_type`.
    #[must_use]
    pub fn collect(samples: &[Sample], analysis_type: &str) -> Vec<Self> {
        samples.iter().filter_map(|s| Self::for_sample(s, analysis_type)).collect()
    }
}

/// Write metrics rows to a TSV file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_metrics(path: &Path, metrics: &[MappingMetrics]) -> Result<()> {
    DelimFile::default()
        .write_tsv(&path, metrics)
        .with_context(|| format!("Failed to write mapping metrics: {}", path.display()))
}
