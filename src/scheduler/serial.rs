use std::panic::{self, AssertUnwindSafe};

use futures::{executor::ThreadPool, future};
use parking_lot::Mutex;

use super::{Scheduler, Task};
use crate::error::{Result, StoreError};

const WORKER_NAME_PREFIX: &str = "statestore-worker-";

/// A single-worker scheduler: tasks run one after another, in submission
/// order, on one dedicated thread.
///
/// The worker is a `futures` thread pool sized to one thread. Once
/// [`shutdown`](Scheduler::shutdown) has been called the worker finishes the
/// tasks already handed to it and exits; later tasks run inline on the
/// submitting thread.
pub struct SerialScheduler {
  pool: Mutex<Option<ThreadPool>>,
}

impl SerialScheduler {
  /// Start a new worker thread.
  pub fn new() -> Result<Self> {
    let pool = ThreadPool::builder()
      .pool_size(1)
      .name_prefix(WORKER_NAME_PREFIX)
      .create()
      .map_err(StoreError::SpawnWorker)?;
    tracing::debug!("serial scheduler worker started");
    Ok(Self { pool: Mutex::new(Some(pool)) })
  }

  /// Whether the worker thread is still accepting tasks.
  pub fn is_running(&self) -> bool { self.pool.lock().is_some() }
}

impl Scheduler for SerialScheduler {
  fn schedule(&self, task: Task) {
    // Clone the handle so the lock is not held while submitting.
    let pool = self.pool.lock().clone();
    match pool {
      Some(pool) => pool.spawn_ok(future::lazy(move |_| run_caught(task))),
      None => task(),
    }
  }

  fn shutdown(&self) {
    if self.pool.lock().take().is_some() {
      tracing::debug!("serial scheduler worker released");
    }
  }
}

impl std::fmt::Debug for SerialScheduler {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SerialScheduler").field("running", &self.is_running()).finish()
  }
}

// A panicking task must not take the only worker down with it.
fn run_caught(task: Task) {
  if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
    let message = payload
      .downcast_ref::<&str>()
      .map(|s| s.to_string())
      .or_else(|| payload.downcast_ref::<String>().cloned())
      .unwrap_or_else(|| "<non-string panic payload>".to_owned());
    tracing::error!(%message, "task panicked on serial scheduler");
  }
}
