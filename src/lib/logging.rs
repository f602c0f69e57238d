//! Logging utilities: tool log files and formatted timing output.
//!
//! [`CommandLog`] is the side channel through which external tool failures are
//! reported. Each invocation that wrote to standard error appends one record
//! (command line, stdout, stderr) to an append-only log file. Writing a record
//! never fails the caller; I/O problems are reported through the `log` facade.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::process::ProcessOutput;
use crate::tools::CommandSpec;

/// Formats a duration in human-readable form.
///
/// # Examples
///
/// ```
/// use refmap_lib::logging::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_secs(45)), "45s");
/// assert_eq!(format_duration(Duration::from_secs(135)), "2m 15s");
/// assert_eq!(format_duration(Duration::from_secs(5400)), "1h 30m");
/// ```
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        let (mins, rem) = (secs / 60, secs % 60);
        if rem == 0 { format!("{mins}m") } else { format!("{mins}m {rem}s") }
    } else {
        let (hours, mins) = (secs / 3600, (secs % 3600) / 60);
        if mins == 0 { format!("{hours}h") } else { format!("{hours}h {mins}m") }
    }
}

/// Times an operation and logs its start and completion.
///
/// ```no_run
/// use refmap_lib::logging::OperationTimer;
///
/// let timer = OperationTimer::new("Mapping samples");
/// // ... do work ...
/// timer.log_completion(12);
/// ```
pub struct OperationTimer {
    operation: String,
    start_time: Instant,
}

impl OperationTimer {
    /// Creates a new operation timer and logs the start.
    #[must_use]
    pub fn new(operation: &str) -> Self {
        log::info!("{operation} ...");
        Self { operation: operation.to_string(), start_time: Instant::now() }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Logs the completion with the number of samples handled.
    pub fn log_completion(&self, samples: usize) {
        log::info!(
            "{} completed: {} sample(s) in {}",
            self.operation,
            samples,
            format_duration(self.elapsed())
        );
    }
}

/// Formats one log record for a command invocation.
#[must_use]
pub fn format_record(command: &CommandSpec, output: &ProcessOutput) -> String {
    let mut record = command.command_line();
    record.push('\n');
    for stream in [output.stdout_lossy(), output.stderr_lossy()] {
        if stream.is_empty() {
            continue;
        }
        record.push_str(&stream);
        if !record.ends_with('\n') {
            record.push('\n');
        }
    }
    record
}

/// An append-only log file for external tool invocations.
#[derive(Debug, Clone)]
pub struct CommandLog {
    path: PathBuf,
}

impl CommandLog {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a record if `output` carries anything on stderr.
    ///
    /// Returns `true` if a record was written.
    pub fn record(&self, command: &CommandSpec, output: &ProcessOutput) -> bool {
        if !output.has_stderr() {
            return false;
        }
        match self.append(&format_record(command, output)) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Could not write to log file {}: {e}", self.path.display());
                false
            }
        }
    }

    fn append(&self, text: &str) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(text.as_bytes())
    }
}
