//! Concurrency tests for the mapping coordinator and its queue.
//!
//! These run the library directly with an in-process runner that sleeps to
//! simulate tool run time, so the number of commands running at once can be
//! observed.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use refmap_lib::config::BatchConfig;
use refmap_lib::pipeline::{IndexStatus, MappingPipeline};
use refmap_lib::process::{ProcessOutput, ProcessRunner};
use refmap_lib::sample::Sample;
use refmap_lib::tools::{Aligner, CommandSpec};
use refmap_lib::work_queue::WorkQueue;
use tempfile::TempDir;

/// Tracks how many commands are running at once.
#[derive(Default)]
struct SlowRunner {
    running: AtomicUsize,
    max_running: AtomicUsize,
    programs: Mutex<Vec<String>>,
}

impl ProcessRunner for SlowRunner {
    fn run(&self, command: &CommandSpec) -> ProcessOutput {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);
        self.programs.lock().push(command.program.clone());
        thread::sleep(Duration::from_millis(20));
        for output in &command.outputs {
            fs::write(output, b"x").expect("Failed to write output");
        }
        self.running.fetch_sub(1, Ordering::SeqCst);
        ProcessOutput::ok()
    }
}

fn setup(threads: usize, n: usize, sort: bool) -> (TempDir, MappingPipeline, Vec<Sample>, Arc<SlowRunner>) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let refs = dir.path().join("refs");
    let out = dir.path().join("out");
    fs::create_dir(&refs).unwrap();
    fs::create_dir(&out).unwrap();
    fs::write(refs.join("genome.fasta"), ">chr1\nACGT\n").unwrap();

    let config = BatchConfig::new(&out, &refs, threads, sort, Aligner::Bowtie2, "rm").unwrap();
    let runner = Arc::new(SlowRunner::default());
    let pipeline = MappingPipeline::new(config, Arc::clone(&runner) as Arc<dyn ProcessRunner>);
    let samples = (0..n)
        .map(|i| {
            let name = format!("sample{i:03}");
            Sample::new(&name, vec![PathBuf::from(format!("/reads/{name}.fq"))], out.join(&name))
        })
        .collect();
    (dir, pipeline, samples, runner)
}

#[test]
fn test_worker_count_bounds_concurrency() {
    let (_dir, pipeline, samples, runner) = setup(3, 12, true);
    let report = pipeline.run(samples).unwrap();

    assert_eq!(report.stats.processed, 12);
    assert_eq!(report.stats.aligned, 12);
    assert_eq!(report.stats.indexed, 12);
    assert!(runner.max_running.load(Ordering::SeqCst) <= 3);
    assert_eq!(runner.running.load(Ordering::SeqCst), 0);
}

#[test]
fn test_index_built_before_any_alignment() {
    let (_dir, pipeline, samples, runner) = setup(4, 20, false);
    let report = pipeline.run(samples).unwrap();

    assert_eq!(report.index, IndexStatus::Built);
    let programs = runner.programs.lock();
    assert_eq!(programs[0], "bowtie2-build");
    assert_eq!(programs.iter().filter(|p| *p == "bowtie2-build").count(), 1);
    assert_eq!(programs.len(), 21);
}

#[test]
fn test_every_sample_done_when_run_returns() {
    let (_dir, pipeline, samples, _runner) = setup(2, 9, false);
    let report = pipeline.run(samples).unwrap();

    assert_eq!(report.samples.len(), 9);
    for sample in &report.samples {
        let result = sample.result("rm").expect("result missing");
        assert!(result.collection_path.exists(), "{} not collected", sample.name);
    }
    assert_eq!(report.stats.collected, 9);
}

#[test]
fn test_queue_backpressure() {
    const CAPACITY: usize = 2;
    let queue = Arc::new(WorkQueue::new(CAPACITY));
    let produced = Arc::new(AtomicUsize::new(0));

    let producer = {
        let queue = Arc::clone(&queue);
        let produced = Arc::clone(&produced);
        thread::spawn(move || {
            for i in 0..5 {
                queue.put(i).unwrap();
                produced.fetch_add(1, Ordering::SeqCst);
            }
        })
    };

    thread::sleep(Duration::from_millis(50));
    assert_eq!(produced.load(Ordering::SeqCst), CAPACITY, "put did not block at capacity");
    assert_eq!(queue.len(), CAPACITY);

    assert_eq!(queue.get(), Some(0));
    queue.mark_done();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(produced.load(Ordering::SeqCst), CAPACITY + 1);

    for _ in 0..4 {
        queue.get().unwrap();
        queue.mark_done();
    }
    producer.join().unwrap();
    queue.join();
    assert_eq!(queue.pending(), 0);
}
