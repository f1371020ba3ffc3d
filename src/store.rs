//! The state container.
//!
//! A [`StateStore`] owns one value of `T`. Callers never lock it: reads and
//! writes are queued under the store's guard and drained by a *flush pass*
//! that runs on the work [`Scheduler`]. Listener notifications go to the
//! callback scheduler.
//!
//! One flush pass:
//!
//! 1. takes every queued reducer as one batch and folds it over the state,
//! 2. stores and announces the result if it differs from the current state,
//! 3. hands the (post-write) state to at most one queued reader,
//! 4. repeats until the queue is empty or the store is closed.
//!
//! Batching means a burst of writes produces one notification with the
//! settled state. Serving one reader per round means every reader sees all
//! writes queued before it, and writes arriving between two reads are applied
//! before the second one runs.

use std::{cell::RefCell, sync::Arc};

use parking_lot::ReentrantMutex;

use crate::{
  defaults,
  error::Result,
  jobs::{Consumer, Jobs, Reducer},
  listeners::{broadcast_close, broadcast_value, CloseListener, Listeners, StateListener},
  scheduler::{Scheduler, SerialScheduler, Task},
  subscription::{CloseSubscription, StateSubscription},
};

struct Inner<T> {
  state: T,
  closed: bool,
  /// Set while a flush pass runs; only the guard holder can observe it.
  flushing: bool,
  jobs: Jobs<T>,
  state_listeners: Listeners<StateListener<T>>,
  close_listeners: Listeners<CloseListener>,
}

pub(crate) struct Core<T> {
  // Re-entrant so that reducers, readers and inline listeners may call back
  // into the store from the thread running the pass. The `RefCell` is only
  // borrowed for short bookkeeping steps, never across user code.
  inner: ReentrantMutex<RefCell<Inner<T>>>,
  scheduler: Arc<dyn Scheduler>,
  callback_scheduler: Arc<dyn Scheduler>,
  owns_scheduler: bool,
}

/// A thread-safe, observable container for a single value of `T`.
///
/// `StateStore` is a handle: clones share the same state, queue and
/// listeners.
///
/// ```rust
/// use statestore::prelude::*;
///
/// let store = StateStore::builder(0)
///   .scheduler(ImmediateScheduler)
///   .build()
///   .unwrap();
///
/// store.set_state(|v| v + 1);
/// store.set_state(|v| v + 1);
/// store.with_state(|v| assert_eq!(v, 2));
/// assert_eq!(store.peek_state(), 2);
/// ```
pub struct StateStore<T> {
  pub(crate) core: Arc<Core<T>>,
}

impl<T> Clone for StateStore<T> {
  #[inline]
  fn clone(&self) -> Self { Self { core: self.core.clone() } }
}

/// Configures the schedulers of a [`StateStore`].
pub struct StateStoreBuilder<T> {
  initial: T,
  scheduler: Option<Arc<dyn Scheduler>>,
  callback_scheduler: Option<Arc<dyn Scheduler>>,
}

impl<T> StateStoreBuilder<T>
where
  T: Clone + PartialEq + Send + 'static,
{
  /// Run flush passes on `scheduler`.
  pub fn scheduler(mut self, scheduler: impl Scheduler + 'static) -> Self {
    self.scheduler = Some(Arc::new(scheduler));
    self
  }

  /// Deliver listener notifications on `scheduler`.
  pub fn callback_scheduler(mut self, scheduler: impl Scheduler + 'static) -> Self {
    self.callback_scheduler = Some(Arc::new(scheduler));
    self
  }

  /// Build the store, falling back to the process-wide defaults and then to a
  /// dedicated [`SerialScheduler`] for anything not configured here.
  pub fn build(self) -> Result<StateStore<T>> {
    let (default_scheduler, default_callback) = defaults::snapshot();
    let (scheduler, owns_scheduler) = match self.scheduler.or(default_scheduler) {
      Some(scheduler) => (scheduler, false),
      None => (Arc::new(SerialScheduler::new()?) as Arc<dyn Scheduler>, true),
    };
    let callback_scheduler =
      self.callback_scheduler.or(default_callback).unwrap_or_else(|| scheduler.clone());

    tracing::debug!(owns_scheduler, "state store created");
    let inner = Inner {
      state: self.initial,
      closed: false,
      flushing: false,
      jobs: Jobs::default(),
      state_listeners: Listeners::default(),
      close_listeners: Listeners::default(),
    };
    Ok(StateStore {
      core: Arc::new(Core {
        inner: ReentrantMutex::new(RefCell::new(inner)),
        scheduler,
        callback_scheduler,
        owns_scheduler,
      }),
    })
  }
}

impl<T> StateStore<T>
where
  T: Clone + PartialEq + Send + 'static,
{
  /// A store using the process-wide default schedulers, or a dedicated worker
  /// thread if none are set.
  pub fn new(initial: T) -> Result<Self> { Self::builder(initial).build() }

  pub fn builder(initial: T) -> StateStoreBuilder<T> {
    StateStoreBuilder { initial, scheduler: None, callback_scheduler: None }
  }

  /// Queue `consumer` to run once with the state, after every write queued
  /// before it. Dropped if the store is closed.
  pub fn with_state(&self, consumer: impl FnOnce(T) + Send + 'static) {
    self.enqueue(|jobs| jobs.enqueue_read(Box::new(consumer) as Consumer<T>));
  }

  /// Queue `reducer` to compute the next state from the current one. Dropped
  /// if the store is closed.
  pub fn set_state(&self, reducer: impl FnOnce(T) -> T + Send + 'static) {
    self.enqueue(|jobs| jobs.enqueue_write(Box::new(reducer) as Reducer<T>));
  }

  /// The current state, ignoring anything still queued.
  pub fn peek_state(&self) -> T {
    let guard = self.core.inner.lock();
    let state = guard.borrow().state.clone();
    state
  }

  pub fn is_closed(&self) -> bool { self.core.inner.lock().borrow().closed }

  /// Register `listener` and deliver the current state to it.
  ///
  /// Returns `false`, without delivering anything, if this listener is
  /// already registered. On a closed store the listener is not kept but
  /// still receives the final state once.
  pub fn add_state_listener(&self, listener: StateListener<T>) -> bool {
    let guard = self.core.inner.lock();
    let (state, closed) = {
      let mut inner = guard.borrow_mut();
      if !inner.closed && !inner.state_listeners.add(listener.clone()) {
        return false;
      }
      (inner.state.clone(), inner.closed)
    };
    let delivery: Task = Box::new(move || listener(state));
    if closed {
      // No change can follow a close, so the delivery needs no ordering.
      drop(guard);
      self.core.callback_scheduler.schedule(delivery);
    } else {
      // Still under the guard: the first delivery is queued before any change
      // this listener can be told about.
      self.core.callback_scheduler.schedule(delivery);
      drop(guard);
    }
    true
  }

  /// Returns `false` if `listener` was not registered.
  pub fn remove_state_listener(&self, listener: &StateListener<T>) -> bool {
    let guard = self.core.inner.lock();
    let removed = guard.borrow_mut().state_listeners.remove(listener);
    removed
  }

  /// Register `listener` to run when the store closes. If it is already
  /// closed the listener runs right away, on the callback scheduler.
  ///
  /// Returns `false` if this listener is already registered.
  pub fn add_close_listener(&self, listener: CloseListener) -> bool {
    {
      let guard = self.core.inner.lock();
      let mut inner = guard.borrow_mut();
      if !inner.closed {
        return inner.close_listeners.add(listener);
      }
    }
    self.core.callback_scheduler.schedule(Box::new(move || listener()));
    true
  }

  /// Returns `false` if `listener` was not registered.
  pub fn remove_close_listener(&self, listener: &CloseListener) -> bool {
    let guard = self.core.inner.lock();
    let removed = guard.borrow_mut().close_listeners.remove(listener);
    removed
  }

  /// Register a closure as a state listener and get a handle that removes it.
  pub fn observe(&self, f: impl Fn(T) + Send + Sync + 'static) -> StateSubscription<T> {
    let listener: StateListener<T> = Arc::new(f);
    self.add_state_listener(listener.clone());
    StateSubscription::new(Arc::downgrade(&self.core), listener)
  }

  /// Register a closure as a close listener and get a handle that removes it.
  pub fn on_close(&self, f: impl Fn() + Send + Sync + 'static) -> CloseSubscription<T> {
    let listener: CloseListener = Arc::new(f);
    self.add_close_listener(listener.clone());
    CloseSubscription::new(Arc::downgrade(&self.core), listener)
  }

  /// Close the store. Only the first call has an effect.
  ///
  /// Pending jobs are discarded, state listeners are dropped, and every close
  /// listener is notified once. A worker thread created for this store is
  /// released once its queued tasks have run.
  pub fn close(&self) {
    let listeners = {
      let guard = self.core.inner.lock();
      let listeners = {
        let mut inner = guard.borrow_mut();
        if inner.closed {
          return;
        }
        inner.closed = true;
        inner.jobs.clear();
        inner.state_listeners.clear();
        inner.close_listeners.take()
      };
      tracing::debug!(close_listeners = listeners.len(), "state store closed");
      listeners
    };

    self.core.callback_scheduler.schedule(Box::new(move || broadcast_close(listeners)));
    if self.core.owns_scheduler {
      self.core.scheduler.shutdown();
    }
  }

  fn enqueue(&self, push: impl FnOnce(&mut Jobs<T>)) {
    let guard = self.core.inner.lock();
    {
      let mut inner = guard.borrow_mut();
      if inner.closed {
        return;
      }
      push(&mut inner.jobs);
    }
    // Enqueue and dispatch form one step under the guard.
    self.core.dispatch_flush();
    drop(guard);
  }
}

impl<T> Core<T>
where
  T: Clone + PartialEq + Send + 'static,
{
  fn dispatch_flush(self: &Arc<Self>) {
    let core = self.clone();
    self.scheduler.schedule(Box::new(move || core.flush()));
  }

  fn flush(&self) {
    let guard = self.inner.lock();
    let Some(_pass) = FlushPass::begin(&guard) else {
      // A pass is already running further up this thread's stack; it will
      // pick up whatever was just queued.
      return;
    };

    loop {
      let writes = {
        let mut inner = guard.borrow_mut();
        if inner.closed {
          break;
        }
        inner.jobs.drain_writes()
      };

      if !writes.is_empty() {
        tracing::trace!(writes = writes.len(), "applying write batch");
        let current = guard.borrow().state.clone();
        let next = writes.into_iter().fold(current, |state, reducer| reducer(state));
        self.commit(&guard, next);
      }

      let read = {
        let mut inner = guard.borrow_mut();
        let consumer = inner.jobs.dequeue_read();
        consumer.map(|consumer| (consumer, inner.state.clone()))
      };
      if let Some((consumer, state)) = read {
        consumer(state);
      }

      if !guard.borrow().jobs.has_jobs() {
        break;
      }
    }
  }

  fn commit(&self, cell: &RefCell<Inner<T>>, next: T) {
    let listeners = {
      let mut inner = cell.borrow_mut();
      if inner.state == next {
        tracing::trace!("write batch left the state unchanged");
        return;
      }
      inner.state = next.clone();
      inner.state_listeners.snapshot()
    };
    tracing::trace!(listeners = listeners.len(), "notifying state listeners");
    self.callback_scheduler.schedule(Box::new(move || broadcast_value(listeners, next)));
  }
}

/// Marks a flush pass as running for as long as it lives.
struct FlushPass<'a, T> {
  cell: &'a RefCell<Inner<T>>,
}

impl<'a, T> FlushPass<'a, T> {
  fn begin(cell: &'a RefCell<Inner<T>>) -> Option<Self> {
    let mut inner = cell.borrow_mut();
    if inner.flushing {
      return None;
    }
    inner.flushing = true;
    Some(Self { cell })
  }
}

impl<T> Drop for FlushPass<'_, T> {
  fn drop(&mut self) {
    if let Ok(mut inner) = self.cell.try_borrow_mut() {
      inner.flushing = false;
    }
  }
}
