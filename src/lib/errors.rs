//! Custom error types for refmap operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for refmap operations
pub type Result<T> = std::result::Result<T, RefmapError>;

/// Error type for refmap startup and validation failures.
///
/// Failures of individual external tool invocations are not represented here;
/// those are recorded in per-analysis log files and never abort a batch.
#[derive(Error, Debug)]
pub enum RefmapError {
    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// A required directory is missing or is not a directory
    #[error("{description} '{}' is not a valid directory", .path.display())]
    MissingDirectory {
        /// Human-readable description (e.g. "Sequence path")
        description: String,
        /// The offending path
        path: PathBuf,
    },

    /// No reference FASTA was found in the reference directory
    #[error("No reference file matching '*.fa*' found in '{}'", .dir.display())]
    MissingReference {
        /// The reference directory that was searched
        dir: PathBuf,
    },

    /// More than one candidate reference FASTA was found
    #[error("Expected exactly one reference file in '{}', found {}: {}", .dir.display(), .candidates.len(), format_paths(.candidates))]
    AmbiguousReference {
        /// The reference directory that was searched
        dir: PathBuf,
        /// Every matching file
        candidates: Vec<PathBuf>,
    },

    /// No read files were found in the sequence directory
    #[error("No FASTQ files found in '{}'", .dir.display())]
    NoSamples {
        /// The sequence directory that was searched
        dir: PathBuf,
    },

    /// A sample's read files could not be interpreted as single- or paired-end
    #[error("Sample '{sample}' has an unsupported read layout: {reason}")]
    InvalidSampleLayout {
        /// The sample name
        sample: String,
        /// Explanation of the problem
        reason: String,
    },
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
}
