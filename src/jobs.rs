use std::collections::VecDeque;

/// A pending write: folds the current state into the next one.
pub type Reducer<T> = Box<dyn FnOnce(T) -> T + Send + 'static>;

/// A pending read: observes the state once.
pub type Consumer<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// The pending operations of one store, in arrival order.
///
/// Writes are only ever taken as a whole batch, reads one at a time.
pub(crate) struct Jobs<T> {
  reads: VecDeque<Consumer<T>>,
  writes: Vec<Reducer<T>>,
}

impl<T> Default for Jobs<T> {
  fn default() -> Self { Self { reads: VecDeque::new(), writes: Vec::new() } }
}

impl<T> Jobs<T> {
  #[inline]
  pub(crate) fn enqueue_read(&mut self, consumer: Consumer<T>) { self.reads.push_back(consumer); }

  #[inline]
  pub(crate) fn enqueue_write(&mut self, reducer: Reducer<T>) { self.writes.push(reducer); }

  /// Take every pending write, leaving a fresh empty batch behind.
  #[inline]
  pub(crate) fn drain_writes(&mut self) -> Vec<Reducer<T>> { std::mem::take(&mut self.writes) }

  #[inline]
  pub(crate) fn dequeue_read(&mut self) -> Option<Consumer<T>> { self.reads.pop_front() }

  #[inline]
  pub(crate) fn has_jobs(&self) -> bool { !self.reads.is_empty() || !self.writes.is_empty() }

  /// Discard everything still pending.
  pub(crate) fn clear(&mut self) {
    self.reads.clear();
    self.writes.clear();
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use super::*;

  #[test]
  fn writes_drain_as_one_fifo_batch() {
    let mut jobs = Jobs::<i32>::default();
    jobs.enqueue_write(Box::new(|v| v + 1));
    jobs.enqueue_write(Box::new(|v| v * 10));

    let batch = jobs.drain_writes();
    assert_eq!(batch.len(), 2);
    assert!(!jobs.has_jobs());
    assert_eq!(batch.into_iter().fold(1, |state, reducer| reducer(state)), 20);
  }

  #[test]
  fn writes_after_drain_start_a_new_batch() {
    let mut jobs = Jobs::<i32>::default();
    jobs.enqueue_write(Box::new(|v| v + 1));
    let first = jobs.drain_writes();
    jobs.enqueue_write(Box::new(|v| v + 2));

    assert_eq!(first.len(), 1);
    assert_eq!(jobs.drain_writes().len(), 1);
    assert!(jobs.drain_writes().is_empty());
  }

  #[test]
  fn reads_dequeue_oldest_first() {
    let seen = Arc::new(Mutex::new(vec![]));
    let mut jobs = Jobs::<i32>::default();
    for tag in ["a", "b"] {
      let c_seen = seen.clone();
      jobs.enqueue_read(Box::new(move |v| c_seen.lock().unwrap().push((tag, v))));
    }

    jobs.dequeue_read().unwrap()(1);
    assert!(jobs.has_jobs());
    jobs.dequeue_read().unwrap()(2);
    assert!(jobs.dequeue_read().is_none());
    assert_eq!(*seen.lock().unwrap(), vec![("a", 1), ("b", 2)]);
  }

  #[test]
  fn clear_discards_pending() {
    let mut jobs = Jobs::<i32>::default();
    jobs.enqueue_read(Box::new(|_| {}));
    jobs.enqueue_write(Box::new(|v| v));
    jobs.clear();

    assert!(!jobs.has_jobs());
  }
}
