//! Execution of external tool commands.
//!
//! A [`ProcessRunner`] turns a [`CommandSpec`] into a [`ProcessOutput`]. Failure
//! is data, not an error: a non-zero exit or a program that cannot be spawned
//! both come back as `success == false` with whatever diagnostics are available
//! in `stderr`. Output streams are captured fully in memory.

use std::process::{Command, Stdio};

use log::debug;

use crate::tools::CommandSpec;

/// Captured result of one external invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub success: bool,
}

impl ProcessOutput {
    /// A successful invocation with empty output streams.
    #[must_use]
    pub fn ok() -> Self {
        Self { success: true, ..Self::default() }
    }

    /// A failed invocation carrying `message` on stderr.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self { stderr: message.into().into_bytes(), ..Self::default() }
    }

    #[must_use]
    pub fn has_stderr(&self) -> bool {
        !self.stderr.is_empty()
    }

    #[must_use]
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    #[must_use]
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Runs external commands.
///
/// Implementations must be shareable across worker threads.
pub trait ProcessRunner: Send + Sync {
    /// Run `command` to completion and capture its output. Never panics or
    /// returns an error for a failing command.
    fn run(&self, command: &CommandSpec) -> ProcessOutput;
}

/// Runs commands as child processes of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, command: &CommandSpec) -> ProcessOutput {
        debug!("Running in {}: {}", command.working_dir.display(), command);
        let result = Command::new(&command.program)
            .args(&command.args)
            .current_dir(&command.working_dir)
            .stdin(Stdio::null())
            .output();

        match result {
            Ok(output) => ProcessOutput {
                stdout: output.stdout,
                stderr: output.stderr,
                success: output.status.success(),
            },
            Err(e) => ProcessOutput::failed(format!("Failed to execute {}: {e}", command.program)),
        }
    }
}
