use super::{Scheduler, Task};

/// Runs each task synchronously, before `schedule` returns.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
  #[inline]
  fn schedule(&self, task: Task) { task() }
}
