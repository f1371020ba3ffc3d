//! Deterministic scheduler for tests.
//!
//! Counts every submission and either runs tasks inline or keeps them queued
//! until [`TestScheduler::flush`] is called, so tests can assert exactly how
//! many flush passes and notifications a store produced.
//!
//! ```rust
//! use statestore::prelude::*;
//!
//! let work = TestScheduler::manual();
//! let store = StateStore::builder(0).scheduler(work.clone()).build().unwrap();
//!
//! store.set_state(|v| v + 1);
//! assert_eq!(store.peek_state(), 0);
//! assert_eq!(work.pending_count(), 1);
//!
//! work.flush();
//! assert_eq!(store.peek_state(), 1);
//! ```

use std::{
  collections::VecDeque,
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  },
};

use parking_lot::Mutex;

use super::{Scheduler, Task};

#[derive(Default)]
struct TestSchedulerState {
  manual: bool,
  schedule_count: AtomicUsize,
  queue: Mutex<VecDeque<Task>>,
}

/// A counting scheduler; clones share the same counters and queue.
#[derive(Clone, Default)]
pub struct TestScheduler {
  state: Arc<TestSchedulerState>,
}

impl TestScheduler {
  /// Tasks run inline, like [`ImmediateScheduler`](super::ImmediateScheduler).
  pub fn immediate() -> Self { Self::default() }

  /// Tasks are queued until [`flush`](Self::flush) or
  /// [`run_next`](Self::run_next).
  pub fn manual() -> Self {
    Self { state: Arc::new(TestSchedulerState { manual: true, ..Default::default() }) }
  }

  /// Number of times `schedule` has been called.
  pub fn schedule_count(&self) -> usize { self.state.schedule_count.load(Ordering::SeqCst) }

  /// Number of queued tasks not yet run. Always zero for `immediate`.
  pub fn pending_count(&self) -> usize { self.state.queue.lock().len() }

  /// Run the oldest queued task. Returns `false` if nothing was queued.
  pub fn run_next(&self) -> bool {
    // The queue lock is released before the task runs: tasks may schedule.
    let task = self.state.queue.lock().pop_front();
    match task {
      Some(task) => {
        task();
        true
      }
      None => false,
    }
  }

  /// Run queued tasks, including ones queued while flushing, until none are
  /// left. Returns how many ran.
  pub fn flush(&self) -> usize {
    let mut ran = 0;
    while self.run_next() {
      ran += 1;
    }
    ran
  }
}

impl Scheduler for TestScheduler {
  fn schedule(&self, task: Task) {
    self.state.schedule_count.fetch_add(1, Ordering::SeqCst);
    if self.state.manual {
      self.state.queue.lock().push_back(task);
    } else {
      task();
    }
  }
}
