//! Input validation utilities
//!
//! This module provides common validation functions for command-line parameters
//! and file-system inputs with consistent error messages.
//!
//! All validation functions use structured error types from [`crate::errors`] so
//! that startup failures are reported before any work is scheduled.

use crate::errors::{RefmapError, Result};
use std::path::Path;

/// Validate that a path exists and is a directory
///
/// # Arguments
/// * `path` - Path to validate
/// * `description` - Human-readable description of the directory (e.g., "Sequence path")
///
/// # Errors
/// Returns an error if the path does not exist or is not a directory
///
/// # Example
/// ```
/// use refmap_lib::validation::validate_dir_exists;
///
/// let result = validate_dir_exists("/nonexistent/dir", "Output path");
/// assert!(result.is_err());
/// ```
pub fn validate_dir_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path_ref = path.as_ref();
    if !path_ref.is_dir() {
        return Err(RefmapError::MissingDirectory {
            description: description.to_string(),
            path: path_ref.to_path_buf(),
        });
    }
    Ok(())
}

/// Validate that a count parameter is at least 1
///
/// # Errors
/// Returns an error if `value` is zero
///
/// # Example
/// ```
/// use refmap_lib::validation::validate_positive;
///
/// assert!(validate_positive(4, "threads").is_ok());
/// assert!(validate_positive(0, "threads").is_err());
/// ```
pub fn validate_positive(value: usize, name: &str) -> Result<()> {
    if value == 0 {
        return Err(RefmapError::InvalidParameter {
            parameter: name.to_string(),
            reason: "must be >= 1".to_string(),
        });
    }
    Ok(())
}

/// Validate that an analysis type can be used as a file-name component
///
/// The analysis type names a sub-directory and prefixes log files, so it must be
/// non-empty and free of path separators.
///
/// # Errors
/// Returns an error if the name is empty or contains a path separator
pub fn validate_analysis_type(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(RefmapError::InvalidParameter {
            parameter: "analysis-type".to_string(),
            reason: format!("'{name}' cannot be used as a directory name"),
        });
    }
    Ok(())
}
