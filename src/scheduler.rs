//! Execution contexts for flush passes and listener notifications.
//!
//! A [`StateStore`](crate::store::StateStore) never runs its own work: every
//! flush pass is handed to a *work* scheduler and every listener notification
//! to a *callback* scheduler. Both only have to honour one contract: accept a
//! zero-argument [`Task`] and run it eventually, keeping the submission order
//! of each submitting thread.
//!
//! | Scheduler | Runs tasks |
//! |-----------|------------|
//! | [`ImmediateScheduler`] | inline, on the submitting thread |
//! | [`SerialScheduler`] | one at a time, on a dedicated worker thread |
//! | [`TestScheduler`] | inline or on demand, counting submissions |
mod immediate;
mod serial;
mod test_scheduler;

pub use immediate::ImmediateScheduler;
pub use serial::SerialScheduler;
pub use test_scheduler::TestScheduler;

use std::sync::Arc;

/// A unit of work submitted to a [`Scheduler`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A Scheduler is an object to order tasks and schedule their execution.
pub trait Scheduler: Send + Sync {
  /// Submit `task` for execution.
  fn schedule(&self, task: Task);

  /// Release any resource held exclusively by this scheduler.
  ///
  /// Tasks already submitted still run. The default does nothing.
  fn shutdown(&self) {}
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
  #[inline]
  fn schedule(&self, task: Task) { (**self).schedule(task) }

  #[inline]
  fn shutdown(&self) { (**self).shutdown() }
}

/// Returns a scheduler that runs every task on the calling thread.
pub fn immediate() -> ImmediateScheduler { ImmediateScheduler }

/// Returns a scheduler backed by a fresh, dedicated worker thread.
pub fn serial() -> crate::error::Result<SerialScheduler> { SerialScheduler::new() }
