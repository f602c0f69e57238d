//! Samples, their per-analysis results, and discovery of samples on disk.
//!
//! A [`Sample`] carries a typed map from analysis type to [`AnalysisResult`]. The
//! coordinator fills in one result per sample before the sample is queued; after
//! that the sample is only read.
//!
//! All output paths are pure functions of the output root, the sample name and
//! the analysis type, so re-running a batch over the same output directory finds
//! the artifacts of the previous run.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::errors::RefmapError;
use crate::tools::{CommandSpec, ToolSettings, with_suffix};

/// Name of the directory under the output root that collects unsorted outputs.
pub const COLLECTION_DIR: &str = "bamfiles";

/// Recognized read file extensions, longest first.
const READ_EXTENSIONS: &[&str] = &[".fastq.gz", ".fq.gz", ".fastq", ".fq"];

/// Trailing read tokens stripped to derive a sample name, with the mate each marks.
const READ_TOKENS: &[(&str, ReadMate)] =
    &[("_R1", ReadMate::First), ("_R2", ReadMate::Second), ("_1", ReadMate::First), ("_2", ReadMate::Second)];

/// Which end of a read pair a file holds, as told by its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadMate {
    First,
    Second,
}

/// One sequenced sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub name: String,
    /// One (single-end) or two (paired-end) read files, R1 first.
    pub reads: Vec<PathBuf>,
    pub output_dir: PathBuf,
    results: BTreeMap<String, AnalysisResult>,
}

impl Sample {
    #[must_use]
    pub fn new(name: impl Into<String>, reads: Vec<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self { name: name.into(), reads, output_dir: output_dir.into(), results: BTreeMap::new() }
    }

    #[must_use]
    pub fn is_paired(&self) -> bool {
        self.reads.len() == 2
    }

    pub fn insert_result(&mut self, analysis_type: &str, result: AnalysisResult) {
        self.results.insert(analysis_type.to_string(), result);
    }

    #[must_use]
    pub fn result(&self, analysis_type: &str) -> Option<&AnalysisResult> {
        self.results.get(analysis_type)
    }

}

/// Derived paths and commands for one sample under one analysis type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub analysis_dir: PathBuf,
    pub unsorted_output: PathBuf,
    pub sorted_output: PathBuf,
    pub sorted_index: PathBuf,
    pub collection_dir: PathBuf,
    pub collection_path: PathBuf,
    pub reference_noext: PathBuf,
    /// Per-sample tool log (`<sample dir>/<analysis>_<tool>_samtools.log`).
    pub log_path: PathBuf,
    pub build_command: CommandSpec,
    pub align_command: CommandSpec,
    /// Present only in sort mode.
    pub index_command: Option<CommandSpec>,
}

impl AnalysisResult {
    /// Derive the paths and commands for `sample`.
    ///
    /// `settings.threads` is the per-process thread count for this sample's tools.
    #[must_use]
    pub fn new(
        sample: &Sample,
        analysis_type: &str,
        output_root: &Path,
        settings: &ToolSettings,
    ) -> Self {
        let analysis_dir = sample.output_dir.join(analysis_type);
        let unsorted_output = analysis_dir.join(format!("{}.bam", sample.name));
        let sorted_output = analysis_dir.join(format!("{}_sorted.bam", sample.name));
        let sorted_index = with_suffix(&sorted_output, ".bai");
        let collection_dir = output_root.join(COLLECTION_DIR);
        let collection_path = collection_dir.join(format!("{}.bam", sample.name));
        let log_path = sample
            .output_dir
            .join(format!("{analysis_type}_{}_samtools.log", settings.aligner.log_token()));

        let align_command =
            settings.align_command(&sample.reads, &sample.output_dir, &unsorted_output, &sorted_output);
        let index_command =
            settings.sort.then(|| settings.index_command(&sorted_output, &sample.output_dir));

        Self {
            analysis_dir,
            unsorted_output,
            sorted_output,
            sorted_index,
            collection_dir,
            collection_path,
            reference_noext: settings.reference_noext.clone(),
            log_path,
            build_command: settings.build_command(),
            align_command,
            index_command,
        }
    }

    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.index_command.is_some()
    }

    /// The file the align command writes.
    #[must_use]
    pub fn primary_output(&self) -> &Path {
        if self.is_sorted() { &self.sorted_output } else { &self.unsorted_output }
    }
}

/// Strip a recognized read extension, returning `None` for non-read files.
fn strip_read_extension(file_name: &str) -> Option<&str> {
    READ_EXTENSIONS.iter().find_map(|ext| file_name.strip_suffix(ext))
}

/// Read stem with a trailing `_001` removed.
fn read_stem(file_name: &str) -> Option<&str> {
    let stem = strip_read_extension(file_name)?;
    Some(stem.strip_suffix("_001").unwrap_or(stem))
}

/// Mate named by a read file's trailing token, or `None` when it carries none.
///
/// ```
/// use refmap_lib::sample::{ReadMate, read_mate};
///
/// assert_eq!(read_mate("S1_L001_R2_001.fastq.gz"), Some(ReadMate::Second));
/// assert_eq!(read_mate("ecoli_1.fq"), Some(ReadMate::First));
/// assert_eq!(read_mate("single.fastq"), None);
/// ```
#[must_use]
pub fn read_mate(file_name: &str) -> Option<ReadMate> {
    let stem = read_stem(file_name)?;
    READ_TOKENS
        .iter()
        .find(|(token, _)| stem.strip_suffix(*token).is_some_and(|rest| !rest.is_empty()))
        .map(|(_, mate)| *mate)
}

/// Sample name for a read file name, or `None` if it is not a read file.
///
/// ```
/// use refmap_lib::sample::sample_name;
///
/// assert_eq!(sample_name("2014-SEQ-0276_S1_L001_R1_001.fastq.gz").as_deref(), Some("2014-SEQ-0276_S1_L001"));
/// assert_eq!(sample_name("ecoli_2.fq").as_deref(), Some("ecoli"));
/// assert_eq!(sample_name("single.fastq").as_deref(), Some("single"));
/// assert_eq!(sample_name("notes.txt"), None);
/// ```
#[must_use]
pub fn sample_name(file_name: &str) -> Option<String> {
    let stem = read_stem(file_name)?;
    let stem = READ_TOKENS.iter().find_map(|(t, _)| stem.strip_suffix(*t)).unwrap_or(stem);
    (!stem.is_empty()).then(|| stem.to_string())
}

/// Group the read files in `sequence_dir` into samples.
///
/// Each sample's output directory is `<output_root>/<name>/`. Samples are
/// returned sorted by name. A two-file sample must hold one R1 file (`_R1` or
/// `_1`) and one R2 file (`_R2` or `_2`); R1 is listed first.
///
/// # Errors
///
/// Returns an error if the directory cannot be read, contains no read files, or
/// a sample has more than two read files or two files that are not an R1/R2 pair.
pub fn discover_samples(sequence_dir: &Path, output_root: &Path) -> Result<Vec<Sample>> {
    let mut grouped: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    let entries = fs::read_dir(sequence_dir)
        .with_context(|| format!("Failed to read sequence directory {}", sequence_dir.display()))?;

    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()).and_then(sample_name) else {
            continue;
        };
        grouped.entry(name).or_default().push(path);
    }

    if grouped.is_empty() {
        return Err(RefmapError::NoSamples { dir: sequence_dir.to_path_buf() }.into());
    }

    grouped
        .into_iter()
        .map(|(name, mut reads)| -> Result<Sample> {
            if reads.len() > 2 {
                return Err(RefmapError::InvalidSampleLayout {
                    sample: name,
                    reason: format!("expected 1 or 2 read files, found {}", reads.len()),
                }
                .into());
            }
            if reads.len() == 2 {
                reads = order_pair(&name, reads)?;
            }
            let output_dir = output_root.join(&name);
            Ok(Sample::new(name, reads, output_dir))
        })
        .collect()
}

/// Order two read files as R1 then R2.
fn order_pair(name: &str, reads: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    let mut mates: Vec<(Option<ReadMate>, PathBuf)> = reads
        .into_iter()
        .map(|path| (path.file_name().and_then(|n| n.to_str()).and_then(read_mate), path))
        .collect();
    mates.sort();
    match mates.as_slice() {
        [(Some(ReadMate::First), _), (Some(ReadMate::Second), _)] => {
            Ok(mates.into_iter().map(|(_, path)| path).collect())
        }
        _ => {
            let files: Vec<String> = mates
                .iter()
                .filter_map(|(_, p)| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .collect();
            Err(RefmapError::InvalidSampleLayout {
                sample: name.to_string(),
                reason: format!("expected one R1 and one R2 read file, found {}", files.join(" and ")),
            }
            .into())
        }
    }
}
