//! Command-line construction for the external mapping tools.
//!
//! Nothing in this module touches the file system or spawns a process. It turns
//! a sample's inputs and the shared batch settings into [`CommandSpec`] values that
//! the [`crate::process`] runner executes later.
//!
//! # Commands per sample
//!
//! - **build**: index the reference (`bowtie2-build` / `bwa index`), shared by every sample
//! - **align**: aligner piped into `samtools view` (and `samtools sort` in sort mode)
//! - **index**: `samtools index` on the sorted output, only in sort mode

use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;

/// Shell used to run piped commands.
const SHELL: &str = "bash";

/// Supported short-read aligners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Aligner {
    /// Bowtie2 (`bowtie2-build` + `bowtie2`)
    #[default]
    Bowtie2,
    /// BWA-MEM (`bwa index` + `bwa mem`)
    Bwa,
}

impl Aligner {
    /// Token used in log file names (`<analysis>_<token>_index.log`).
    #[must_use]
    pub fn log_token(self) -> &'static str {
        match self {
            Aligner::Bowtie2 => "bowtie",
            Aligner::Bwa => "bwa",
        }
    }

    /// The index file a fresh build is expected to write.
    #[must_use]
    pub fn index_artifact(self, reference: &Path, reference_noext: &Path) -> PathBuf {
        match self {
            Aligner::Bowtie2 => with_suffix(reference_noext, ".1.bt2"),
            Aligner::Bwa => with_suffix(reference, ".bwt"),
        }
    }

    /// Files whose presence means the reference index has already been built.
    ///
    /// Any one of the returned paths existing is sufficient; bowtie2 writes
    /// `.bt2l` files instead of `.bt2` for large references.
    #[must_use]
    pub fn index_artifacts(self, reference: &Path, reference_noext: &Path) -> Vec<PathBuf> {
        let mut artifacts = vec![self.index_artifact(reference, reference_noext)];
        if self == Aligner::Bowtie2 {
            artifacts.push(with_suffix(reference_noext, ".1.bt2l"));
        }
        artifacts
    }
}

impl fmt::Display for Aligner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aligner::Bowtie2 => write!(f, "bowtie2"),
            Aligner::Bwa => write!(f, "bwa"),
        }
    }
}

/// An external command: program, ordered arguments and working directory.
///
/// `outputs` lists the artifacts the command is expected to create. The runner
/// does not use them; they document the command and let callers and tests reason
/// about what a successful run leaves behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub outputs: Vec<PathBuf>,
}

impl CommandSpec {
    #[must_use]
    pub fn new(program: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
            outputs: Vec::new(),
        }
    }

    /// A pipeline run through `bash -c` with `pipefail`, so a failing stage fails the command.
    #[must_use]
    pub fn shell(pipeline: &str, working_dir: impl Into<PathBuf>) -> Self {
        Self::new(SHELL, working_dir).arg("-c").arg(format!("set -o pipefail; {pipeline}"))
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    #[must_use]
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.outputs.push(path.into());
        self
    }

    /// The command line as it would be typed into a shell.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(shell_quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Quote a word for a POSIX shell if it contains anything outside a safe set.
#[must_use]
pub fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word.bytes().all(|b| b.is_ascii_alphanumeric() || b"-_./=:,@+%".contains(&b));
    if safe { word.to_string() } else { format!("'{}'", word.replace('\'', r"'\''")) }
}

fn quote_path(path: &Path) -> String {
    shell_quote(&path.to_string_lossy())
}

/// Append a literal suffix to a path without treating it as an extension.
#[must_use]
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

/// The reference path with its final extension removed (`ref/genome.fasta` -> `ref/genome`).
#[must_use]
pub fn strip_extension(path: &Path) -> PathBuf {
    path.with_extension("")
}

/// Shared, sample-independent inputs to command construction.
#[derive(Debug, Clone)]
pub struct ToolSettings {
    pub aligner: Aligner,
    pub reference: PathBuf,
    pub reference_noext: PathBuf,
    pub threads: usize,
    pub sort: bool,
}

impl ToolSettings {
    #[must_use]
    pub fn new(aligner: Aligner, reference: &Path, threads: usize, sort: bool) -> Self {
        Self {
            aligner,
            reference: reference.to_path_buf(),
            reference_noext: strip_extension(reference),
            threads: threads.max(1),
            sort,
        }
    }

    /// Same settings with a different per-process thread count.
    #[must_use]
    pub fn with_threads(&self, threads: usize) -> Self {
        Self { threads: threads.max(1), ..self.clone() }
    }

    fn reference_dir(&self) -> PathBuf {
        self.reference.parent().map(Path::to_path_buf).unwrap_or_default()
    }

    /// The reference index build command, run in the reference directory.
    #[must_use]
    pub fn build_command(&self) -> CommandSpec {
        let dir = self.reference_dir();
        let primary = self.aligner.index_artifact(&self.reference, &self.reference_noext);
        let cmd = match self.aligner {
            Aligner::Bowtie2 => CommandSpec::new("bowtie2-build", dir)
                .arg("--threads")
                .arg(self.threads.to_string())
                .path_arg(&self.reference)
                .path_arg(&self.reference_noext),
            Aligner::Bwa => CommandSpec::new("bwa", dir).arg("index").path_arg(&self.reference),
        };
        cmd.output(primary)
    }

    fn aligner_invocation(&self, reads: &[PathBuf]) -> String {
        let threads = self.threads;
        match self.aligner {
            Aligner::Bowtie2 => {
                let index = quote_path(&self.reference_noext);
                let inputs = match reads {
                    [r1, r2] => format!("-1 {} -2 {}", quote_path(r1), quote_path(r2)),
                    _ => reads
                        .iter()
                        .map(|r| format!("-U {}", quote_path(r)))
                        .collect::<Vec<_>>()
                        .join(" "),
                };
                format!("bowtie2 -p {threads} -x {index} {inputs}")
            }
            Aligner::Bwa => {
                let inputs = reads.iter().map(|r| quote_path(r)).collect::<Vec<_>>().join(" ");
                format!("bwa mem -t {threads} {} {inputs}", quote_path(&self.reference))
            }
        }
    }

    /// The alignment pipeline for one sample.
    ///
    /// In sort mode the output is `sorted`; otherwise it is `unsorted`.
    #[must_use]
    pub fn align_command(
        &self,
        reads: &[PathBuf],
        working_dir: &Path,
        unsorted: &Path,
        sorted: &Path,
    ) -> CommandSpec {
        let threads = self.threads;
        let align = self.aligner_invocation(reads);
        let view = format!("samtools view -@ {threads} -h -F 4 -bS");
        if self.sort {
            let pipeline = format!(
                "{align} | {view} - | samtools sort -@ {threads} -o {} -",
                quote_path(sorted)
            );
            CommandSpec::shell(&pipeline, working_dir).output(sorted)
        } else {
            let pipeline = format!("{align} | {view} -o {} -", quote_path(unsorted));
            CommandSpec::shell(&pipeline, working_dir).output(unsorted)
        }
    }

    /// `samtools index` for a sorted output, producing `<sorted>.bai`.
    #[must_use]
    pub fn index_command(&self, sorted: &Path, working_dir: &Path) -> CommandSpec {
        CommandSpec::new("samtools", working_dir)
            .arg("index")
            .path_arg(sorted)
            .output(with_suffix(sorted, ".bai"))
    }
}
