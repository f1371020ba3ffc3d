use std::sync::Arc;

use smallvec::SmallVec;

/// Notified with every distinct state, and once with the current state when
/// registered.
pub type StateListener<T> = Arc<dyn Fn(T) + Send + Sync + 'static>;

/// Notified once when the store closes.
pub type CloseListener = Arc<dyn Fn() + Send + Sync + 'static>;

/// Identity of a registered listener.
pub(crate) trait SameListener {
  fn same_listener(&self, other: &Self) -> bool;
}

impl<F: ?Sized> SameListener for Arc<F> {
  // Compare the data pointers only; vtable pointers of the same closure may
  // differ between codegen units.
  #[inline]
  fn same_listener(&self, other: &Self) -> bool {
    Arc::as_ptr(self) as *const () == Arc::as_ptr(other) as *const ()
  }
}

pub(crate) type Snapshot<L> = SmallVec<[L; 2]>;

/// Registered listeners in insertion order, without duplicates.
///
/// Most stores have one or two listeners, so the storage stays inline until
/// a third one is added.
pub(crate) struct Listeners<L> {
  items: SmallVec<[L; 2]>,
}

impl<L> Default for Listeners<L> {
  fn default() -> Self { Self { items: SmallVec::new() } }
}

impl<L: SameListener + Clone> Listeners<L> {
  /// Register `listener`. Returns `false` if it is already registered.
  pub(crate) fn add(&mut self, listener: L) -> bool {
    if self.contains(&listener) {
      return false;
    }
    self.items.push(listener);
    true
  }

  /// Unregister `listener`. Returns `false` if it was not registered.
  pub(crate) fn remove(&mut self, listener: &L) -> bool {
    self
      .items
      .iter()
      .position(|l| l.same_listener(listener))
      .map(|pos| self.items.remove(pos))
      .is_some()
  }

  #[inline]
  pub(crate) fn contains(&self, listener: &L) -> bool {
    self.items.iter().any(|l| l.same_listener(listener))
  }

  /// The current listeners, in insertion order.
  #[inline]
  pub(crate) fn snapshot(&self) -> Snapshot<L> { self.items.clone() }

  /// Take every listener, leaving the set empty.
  #[inline]
  pub(crate) fn take(&mut self) -> Snapshot<L> { std::mem::take(&mut self.items) }

  #[inline]
  pub(crate) fn clear(&mut self) { self.items.clear() }

  #[cfg(test)]
  pub(crate) fn len(&self) -> usize { self.items.len() }
}

/// Deliver `value` to every listener in order.
///
/// The value is cloned for all listeners except the last one, which receives
/// it by move.
pub(crate) fn broadcast_value<T: Clone>(listeners: Snapshot<StateListener<T>>, value: T) {
  let mut iter = listeners.into_iter().peekable();
  while let Some(listener) = iter.next() {
    if iter.peek().is_some() {
      listener(value.clone());
    } else {
      listener(value);
      break;
    }
  }
}

/// Invoke every close listener once, in order.
pub(crate) fn broadcast_close(listeners: Snapshot<CloseListener>) {
  for listener in listeners {
    listener();
  }
}
