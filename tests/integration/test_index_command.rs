//! Tests for `refmap index`.

use crate::helpers::{Batch, FakeTools, path_str};

fn index_args(batch: &Batch, extra: &[&str]) -> Vec<String> {
    let mut args = vec!["index".to_string(), "-r".to_string(), path_str(&batch.refs)];
    args.extend(extra.iter().map(|s| (*s).to_string()));
    args
}

#[test]
fn test_index_builds_once() {
    let batch = Batch::new(&[]);
    let tools = FakeTools::install();

    assert!(tools.run_refmap(&index_args(&batch, &["-t", "3"])).status.success());
    assert!(batch.refs.join("genome.1.bt2").exists());
    assert_eq!(tools.invocations(), vec![format!(
        "bowtie2-build --threads 3 {} {}",
        path_str(&batch.refs.join("genome.fa")),
        path_str(&batch.refs.join("genome"))
    )]);

    assert!(tools.run_refmap(&index_args(&batch, &[])).status.success());
    assert_eq!(tools.count("bowtie2-build"), 1);
}

#[test]
fn test_index_with_bwa() {
    let batch = Batch::new(&[]);
    let tools = FakeTools::install();

    assert!(tools.run_refmap(&index_args(&batch, &["--aligner", "bwa"])).status.success());
    assert!(batch.refs.join("genome.fa.bwt").exists());
    assert_eq!(tools.count("bwa"), 1);
}

#[test]
fn test_index_failure_exits_non_zero() {
    let batch = Batch::new(&[]);
    let empty = tempfile::TempDir::new().unwrap();

    // Nothing on PATH: the build command cannot be started.
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_refmap"))
        .args(index_args(&batch, &[]))
        .env("PATH", empty.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Index build failed"));
    let log = std::fs::read_to_string(batch.refs.join("referencemapping_bowtie_index.log")).unwrap();
    assert!(log.contains("Failed to execute bowtie2-build"));
}
