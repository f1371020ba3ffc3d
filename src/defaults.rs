//! Process-wide default schedulers.
//!
//! A [`StateStoreBuilder`](crate::store::StateStoreBuilder) reads these once,
//! in `build`. Changing them afterwards has no effect on stores that already
//! exist.
//!
//! Resolution order for the work scheduler: the builder's value, then the
//! default set here, then a new [`SerialScheduler`](crate::scheduler::SerialScheduler)
//! owned by the store. For the callback scheduler: the builder's value, then
//! the default set here, then whatever work scheduler was resolved.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::scheduler::Scheduler;

#[derive(Default, Clone)]
struct Defaults {
  scheduler: Option<Arc<dyn Scheduler>>,
  callback_scheduler: Option<Arc<dyn Scheduler>>,
}

static DEFAULTS: Lazy<RwLock<Defaults>> = Lazy::new(|| RwLock::new(Defaults::default()));

/// Use `scheduler` to run flush passes of stores built from now on.
pub fn set_default_scheduler(scheduler: impl Scheduler + 'static) {
  DEFAULTS.write().scheduler = Some(Arc::new(scheduler));
}

/// Use `scheduler` to deliver notifications of stores built from now on.
pub fn set_default_callback_scheduler(scheduler: impl Scheduler + 'static) {
  DEFAULTS.write().callback_scheduler = Some(Arc::new(scheduler));
}

/// Forget both defaults.
pub fn reset_defaults() { *DEFAULTS.write() = Defaults::default(); }

/// The current default work scheduler, if any.
pub fn default_scheduler() -> Option<Arc<dyn Scheduler>> { DEFAULTS.read().scheduler.clone() }

/// The current default callback scheduler, if any.
pub fn default_callback_scheduler() -> Option<Arc<dyn Scheduler>> {
  DEFAULTS.read().callback_scheduler.clone()
}

/// Both defaults, read under one lock.
pub(crate) fn snapshot() -> (Option<Arc<dyn Scheduler>>, Option<Arc<dyn Scheduler>>) {
  let defaults = DEFAULTS.read().clone();
  (defaults.scheduler, defaults.callback_scheduler)
}

/// Serialises tests that touch the process-wide defaults.
#[cfg(test)]
pub(crate) static TEST_LOCK: parking_lot::Mutex<()> = parking_lot::const_mutex(());
