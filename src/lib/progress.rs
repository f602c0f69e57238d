//! Progress tracking for a batch of samples.
//!
//! Workers report each finished sample to a shared [`SampleProgress`], which
//! logs a line every `interval` completions and always logs the final one.

use log::info;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Thread-safe counter of completed samples.
///
/// # Example
/// ```
/// use refmap_lib::progress::SampleProgress;
///
/// let progress = SampleProgress::new(3).with_interval(2);
/// progress.record("A");
/// progress.record("B"); // logs "Finished 2/3 samples"
/// progress.record("C"); // logs "Finished 3/3 samples"
/// assert!(progress.is_complete());
/// ```
#[derive(Debug)]
pub struct SampleProgress {
    total: usize,
    interval: usize,
    completed: AtomicUsize,
}

impl SampleProgress {
    /// Track `total` samples, logging after every completion.
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self { total, interval: 1, completed: AtomicUsize::new(0) }
    }

    /// Log every `interval` completions (an interval of 0 is treated as 1).
    #[must_use]
    pub fn with_interval(mut self, interval: usize) -> Self {
        self.interval = interval.max(1);
        self
    }

    /// Record one finished sample and return the new completed count.
    pub fn record(&self, sample: &str) -> usize {
        let done = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        if done.is_multiple_of(self.interval) || done == self.total {
            info!("Finished {done}/{} samples (last: {sample})", self.total);
        }
        done
    }

    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed() >= self.total
    }
}
