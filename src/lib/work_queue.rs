//! Bounded blocking work queue with join semantics.
//!
//! [`WorkQueue`] is the only synchronized structure shared between the
//! coordinator and the worker pool:
//!
//! - [`WorkQueue::put`] blocks while the buffer is at capacity (backpressure)
//! - [`WorkQueue::get`] blocks while the buffer is empty
//! - [`WorkQueue::mark_done`] records that a previously dequeued item is finished
//! - [`WorkQueue::join`] blocks until every item ever put has been marked done
//!
//! A batch is complete when `join` returns, not when the buffer is empty: an item
//! that has been dequeued but not yet marked done still counts as pending.
//!
//! [`WorkQueue::close`] is the shutdown signal. Blocked producers get their item
//! back, and consumers drain the remaining buffer before `get` returns `None`.
//!
//! # Example
//!
//! ```
//! use refmap_lib::work_queue::WorkQueue;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let queue = Arc::new(WorkQueue::new(2));
//! let consumer = {
//!     let queue = Arc::clone(&queue);
//!     thread::spawn(move || {
//!         while let Some(n) = queue.get() {
//!             let _ = n * 2;
//!             queue.mark_done();
//!         }
//!     })
//! };
//!
//! for n in 0..10 {
//!     queue.put(n).unwrap();
//! }
//! queue.join();
//! assert_eq!(queue.pending(), 0);
//!
//! queue.close();
//! consumer.join().unwrap();
//! ```

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

struct QueueState<T> {
    items: VecDeque<T>,
    /// Items put but not yet marked done (buffered + in flight).
    pending: usize,
    closed: bool,
}

/// A bounded, thread-safe FIFO queue with task-completion tracking.
pub struct WorkQueue<T> {
    state: Mutex<QueueState<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    all_done: Condvar,
    capacity: usize,
}

impl<T> WorkQueue<T> {
    /// Create a queue buffering at most `capacity` items (a capacity of 0 is treated as 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                pending: 0,
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            all_done: Condvar::new(),
            capacity,
        }
    }

    /// Add an item, blocking while the buffer is full.
    ///
    /// # Errors
    ///
    /// Returns the item if the queue has been closed.
    pub fn put(&self, item: T) -> Result<(), T> {
        let mut state = self.state.lock();
        while state.items.len() >= self.capacity && !state.closed {
            self.not_full.wait(&mut state);
        }
        if state.closed {
            return Err(item);
        }
        self.push_locked(&mut state, item);
        Ok(())
    }

    /// Add an item without blocking.
    ///
    /// # Errors
    ///
    /// Returns the item if the buffer is full or the queue has been closed.
    pub fn try_put(&self, item: T) -> Result<(), T> {
        let mut state = self.state.lock();
        if state.closed || state.items.len() >= self.capacity {
            return Err(item);
        }
        self.push_locked(&mut state, item);
        Ok(())
    }

    fn push_locked(&self, state: &mut QueueState<T>, item: T) {
        state.items.push_back(item);
        state.pending += 1;
        self.not_empty.notify_one();
    }

    /// Remove the oldest item, blocking while the buffer is empty.
    ///
    /// Returns `None` only once the queue is closed and fully drained.
    pub fn get(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                self.not_full.notify_one();
                return Some(item);
            }
            if state.closed {
                return None;
            }
            self.not_empty.wait(&mut state);
        }
    }

    /// Record that one dequeued item has been fully processed.
    ///
    /// Must be called exactly once per item returned by [`get`](Self::get),
    /// whether or not processing succeeded; otherwise [`join`](Self::join) never returns.
    pub fn mark_done(&self) {
        let mut state = self.state.lock();
        if state.pending == 0 {
            log::warn!("mark_done called more times than items were queued");
            return;
        }
        state.pending -= 1;
        if state.pending == 0 {
            self.all_done.notify_all();
        }
    }

    /// Block until every item put so far has been marked done.
    ///
    /// Returns immediately if nothing is pending.
    pub fn join(&self) {
        let mut state = self.state.lock();
        while state.pending > 0 {
            self.all_done.wait(&mut state);
        }
    }

    /// Close the queue, waking all blocked producers and consumers.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Number of buffered items not yet dequeued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// Number of items put but not yet marked done.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.lock().pending
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
