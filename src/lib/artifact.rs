//! Idempotency checks on durable artifacts.
//!
//! Every external invocation and every move is preceded by one of these checks.
//! Results are never cached: another worker or an earlier run may have created
//! the artifact since the last look. The check-then-act window is not atomic,
//! which is why the shared reference index is built once by the coordinator
//! before any worker sees a sample.

use std::path::Path;

use crate::tools::Aligner;

/// Decision for a single gated step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// The artifact is missing; the step must run.
    Run,
    /// The artifact already exists; the step is skipped.
    Skip,
}

impl Gate {
    #[must_use]
    pub fn should_run(self) -> bool {
        self == Gate::Run
    }
}

/// True if at least one of `paths` exists.
#[must_use]
pub fn any_exists<P: AsRef<Path>>(paths: &[P]) -> bool {
    paths.iter().any(|p| p.as_ref().exists())
}

/// True if every one of `paths` exists (vacuously true for an empty slice).
#[must_use]
pub fn all_exist<P: AsRef<Path>>(paths: &[P]) -> bool {
    paths.iter().all(|p| p.as_ref().exists())
}

/// Skip when any of the target artifacts already exists.
#[must_use]
pub fn gate_on<P: AsRef<Path>>(targets: &[P]) -> Gate {
    if any_exists(targets) { Gate::Skip } else { Gate::Run }
}

/// True if the reference index for `aligner` has already been built.
#[must_use]
pub fn index_present(aligner: Aligner, reference: &Path, reference_noext: &Path) -> bool {
    any_exists(&aligner.index_artifacts(reference, reference_noext))
}

/// Gate for the alignment step: skip when either the primary output or the
/// collected copy already exists.
#[must_use]
pub fn align_gate(primary_output: &Path, collection_path: &Path) -> Gate {
    gate_on(&[primary_output, collection_path])
}

/// Gate for indexing a sorted output: run only when the sorted output exists
/// and its index does not.
#[must_use]
pub fn index_gate(sorted: &Path, sorted_index: &Path) -> Gate {
    if sorted.exists() && !sorted_index.exists() { Gate::Run } else { Gate::Skip }
}

/// Gate for collecting an unsorted output: run only when the source exists and
/// the collected copy does not.
#[must_use]
pub fn collect_gate(source: &Path, destination: &Path) -> Gate {
    if source.exists() && !destination.exists() { Gate::Run } else { Gate::Skip }
}
