//! End-to-end tests for `refmap map`.

use fgoxide::io::DelimFile;
use refmap_lib::metrics::MappingMetrics;
use std::fs;

use crate::helpers::{Batch, FakeTools, path_str, snapshot};

#[test]
fn test_map_collects_unsorted_outputs() {
    let batch = Batch::paired_and_single();
    let tools = FakeTools::install();

    let output = tools.run_refmap(&batch.map_args());
    assert!(output.status.success(), "map failed: {}", String::from_utf8_lossy(&output.stderr));

    assert_eq!(tools.count("bowtie2-build"), 1);
    assert_eq!(tools.count("bowtie2"), 2);
    assert!(batch.refs.join("genome.1.bt2").exists());

    for sample in ["P", "U"] {
        let collected = batch.out.join("bamfiles").join(format!("{sample}.bam"));
        assert!(collected.exists(), "{sample} was not collected");
        assert!(fs::read_to_string(&collected).unwrap().contains("read1"));
        let analysis_dir = batch.out.join(sample).join("referencemapping");
        assert!(analysis_dir.is_dir());
        assert!(!analysis_dir.join(format!("{sample}.bam")).exists());

        let log = batch.out.join(sample).join("referencemapping_bowtie_samtools.log");
        let log = fs::read_to_string(log).unwrap();
        assert!(log.starts_with("bash -c "));
        assert!(log.contains("1 reads; of these:"));
    }

    let index_log = fs::read_to_string(batch.refs.join("referencemapping_bowtie_index.log")).unwrap();
    assert!(index_log.starts_with("bowtie2-build --threads 2"));

    let paired = tools.invocations().into_iter().find(|l| l.contains("P_R1")).unwrap();
    assert!(paired.contains("-1 ") && paired.contains("-2 "), "{paired}");
    let single = tools.invocations().into_iter().find(|l| l.contains("U.fq")).unwrap();
    assert!(single.contains("-U "), "{single}");
}

#[test]
fn test_second_run_is_a_no_op() {
    let batch = Batch::paired_and_single();
    let tools = FakeTools::install();

    assert!(tools.run_refmap(&batch.map_args()).status.success());
    let calls = tools.invocations().len();
    let mut before = snapshot(&batch.out);
    before.retain(|(p, _)| !p.ends_with("referencemapping_metrics.txt"));

    assert!(tools.run_refmap(&batch.map_args()).status.success());
    assert_eq!(tools.invocations().len(), calls, "second run invoked external tools");
    let mut after = snapshot(&batch.out);
    after.retain(|(p, _)| !p.ends_with("referencemapping_metrics.txt"));
    assert_eq!(before, after);
}

#[test]
fn test_sort_mode_sorts_and_indexes() {
    let batch = Batch::paired_and_single();
    let tools = FakeTools::install();
    let mut args = batch.map_args();
    args.push("--sort".to_string());

    assert!(tools.run_refmap(&args).status.success());

    for sample in ["P", "U"] {
        let dir = batch.out.join(sample).join("referencemapping");
        assert!(dir.join(format!("{sample}_sorted.bam")).exists());
        assert!(dir.join(format!("{sample}_sorted.bam.bai")).exists());
    }
    assert!(!batch.out.join("bamfiles").exists());
    assert_eq!(tools.count("samtools"), 2 * 2 + 2);

    let calls = tools.invocations().len();
    assert!(tools.run_refmap(&args).status.success());
    assert_eq!(tools.invocations().len(), calls);
}

#[test]
fn test_metrics_file() {
    let batch = Batch::paired_and_single();
    let tools = FakeTools::install();
    let metrics_path = batch.root.path().join("metrics.tsv");
    let mut args = batch.map_args();
    args.extend(["--metrics".to_string(), path_str(&metrics_path)]);

    assert!(tools.run_refmap(&args).status.success());

    let rows: Vec<MappingMetrics> = DelimFile::default().read_tsv(&metrics_path).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].sample, "P");
    assert!(rows[0].paired);
    assert_eq!(rows[1].sample, "U");
    assert!(!rows[1].paired);
    assert!(rows.iter().all(|r| r.collected && !r.primary_output_exists && !r.index_exists));
    assert!(rows.iter().all(|r| r.analysis_type == "referencemapping"));
}

#[test]
fn test_bwa_and_custom_analysis_type() {
    let batch = Batch::new(&["S_1.fq", "S_2.fq"]);
    let tools = FakeTools::install();
    let mut args = batch.map_args();
    args.extend(["--aligner", "bwa", "--analysis-type", "bwamap"].map(String::from));

    assert!(tools.run_refmap(&args).status.success());

    assert_eq!(tools.count("bwa"), 2);
    assert!(batch.refs.join("genome.fa.bwt").exists());
    let index_log = fs::read_to_string(batch.refs.join("bwamap_bwa_index.log")).unwrap();
    assert!(index_log.contains("[bwa_index]"));
    assert!(batch.out.join("bamfiles").join("S.bam").exists());
    assert!(batch.out.join("S").join("bwamap").is_dir());
    assert!(batch.out.join("S").join("bwamap_bwa_samtools.log").exists());
    assert!(batch.out.join("bwamap_metrics.txt").exists());
}

#[test]
fn test_existing_collected_output_is_not_realigned() {
    let batch = Batch::paired_and_single();
    let tools = FakeTools::install();
    let collected = batch.out.join("bamfiles");
    fs::create_dir(&collected).unwrap();
    fs::write(collected.join("U.bam"), b"from an earlier run").unwrap();

    assert!(tools.run_refmap(&batch.map_args()).status.success());

    assert_eq!(tools.count("bowtie2"), 1);
    assert!(!tools.invocations().iter().any(|l| l.contains("U.fq")));
    assert_eq!(fs::read(collected.join("U.bam")).unwrap(), b"from an earlier run");
}

#[test]
fn test_failing_sample_does_not_stop_batch() {
    let batch = Batch::new(&["A.fq", "missing_R1.fq", "C.fq"]);
    let tools = FakeTools::install();

    let output = tools.run_refmap(&batch.map_args());
    assert!(output.status.success());

    assert_eq!(tools.count("bowtie2"), 3);
    assert!(batch.out.join("bamfiles").join("A.bam").exists());
    assert!(batch.out.join("bamfiles").join("C.bam").exists());
    let log = batch.out.join("missing").join("referencemapping_bowtie_samtools.log");
    assert!(fs::read_to_string(log).unwrap().contains("does not exist"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("had failures"));
    assert!(!batch.out.join("bamfiles").join("missing.bam").exists());
    assert!(!batch.out.join("missing").join("referencemapping").join("missing.bam").exists());

    // Only the failed sample is aligned again on the next run.
    assert!(tools.run_refmap(&batch.map_args()).status.success());
    assert_eq!(tools.count("bowtie2"), 4);
    let missing_runs =
        tools.invocations().iter().filter(|l| l.starts_with("bowtie2 ") && l.contains("missing")).count();
    assert_eq!(missing_runs, 2);
}
