use std::{
  fmt::{Debug, Formatter},
  sync::{Arc, Weak},
};

use crate::{
  listeners::{CloseListener, StateListener},
  store::{Core, StateStore},
};

/// A registration that can be cancelled before the store closes.
pub trait SubscriptionLike {
  /// Stop receiving notifications. Calling it again does nothing.
  fn unsubscribe(&mut self);

  /// Whether no further notification can arrive through this registration.
  fn is_closed(&self) -> bool;
}

/// Handle returned by [`StateStore::observe`].
#[must_use = "dropping the handle keeps the listener registered; call `unsubscribe_when_dropped` \
              to tie the registration to its scope"]
pub struct StateSubscription<T> {
  store: Weak<Core<T>>,
  listener: Option<StateListener<T>>,
}

/// Handle returned by [`StateStore::on_close`].
#[must_use = "dropping the handle keeps the listener registered; call `unsubscribe_when_dropped` \
              to tie the registration to its scope"]
pub struct CloseSubscription<T> {
  store: Weak<Core<T>>,
  listener: Option<CloseListener>,
}

impl<T> StateSubscription<T> {
  pub(crate) fn new(store: Weak<Core<T>>, listener: StateListener<T>) -> Self {
    Self { store, listener: Some(listener) }
  }
}

impl<T> CloseSubscription<T> {
  pub(crate) fn new(store: Weak<Core<T>>, listener: CloseListener) -> Self {
    Self { store, listener: Some(listener) }
  }
}

fn upgrade<T>(store: &Weak<Core<T>>) -> Option<StateStore<T>> {
  store.upgrade().map(|core: Arc<Core<T>>| StateStore { core })
}

impl<T> SubscriptionLike for StateSubscription<T>
where
  T: Clone + PartialEq + Send + 'static,
{
  fn unsubscribe(&mut self) {
    if let (Some(listener), Some(store)) = (self.listener.take(), upgrade(&self.store)) {
      store.remove_state_listener(&listener);
    }
  }

  fn is_closed(&self) -> bool {
    self.listener.is_none() || upgrade(&self.store).map_or(true, |store| store.is_closed())
  }
}

impl<T> SubscriptionLike for CloseSubscription<T>
where
  T: Clone + PartialEq + Send + 'static,
{
  fn unsubscribe(&mut self) {
    if let (Some(listener), Some(store)) = (self.listener.take(), upgrade(&self.store)) {
      store.remove_close_listener(&listener);
    }
  }

  fn is_closed(&self) -> bool {
    self.listener.is_none() || upgrade(&self.store).map_or(true, |store| store.is_closed())
  }
}

macro_rules! impl_subscription_helpers {
  ($ty: ident) => {
    impl<T> $ty<T>
    where
      T: Clone + PartialEq + Send + 'static,
    {
      /// Unsubscribe automatically when the returned guard is dropped.
      pub fn unsubscribe_when_dropped(self) -> SubscriptionGuard<Self> { SubscriptionGuard(self) }
    }

    impl<T> Debug for $ty<T> {
      fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!($ty)).field("active", &self.listener.is_some()).finish()
      }
    }
  };
}

impl_subscription_helpers!(StateSubscription);
impl_subscription_helpers!(CloseSubscription);

/// An RAII implementation of a "scoped subscription". When this structure is
/// dropped (falls out of scope), the subscription will be unsubscribed.
#[derive(Debug)]
#[must_use]
pub struct SubscriptionGuard<S: SubscriptionLike>(pub(crate) S);

impl<S: SubscriptionLike> SubscriptionGuard<S> {
  /// Wraps an existing subscription with a guard to enable RAII behavior for
  /// it.
  pub fn new(subscription: S) -> SubscriptionGuard<S> { SubscriptionGuard(subscription) }
}

impl<S: SubscriptionLike> Drop for SubscriptionGuard<S> {
  #[inline]
  fn drop(&mut self) { self.0.unsubscribe() }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use super::*;
  use crate::scheduler;

  fn store() -> StateStore<i32> {
    StateStore::builder(0)
      .scheduler(scheduler::immediate())
      .callback_scheduler(scheduler::immediate())
      .build()
      .unwrap()
  }

  #[test]
  fn unsubscribe_stops_notifications() {
    let store = store();
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let mut subscription = store.observe(move |v| c_seen.lock().unwrap().push(v));

    store.set_state(|v| v + 1);
    assert!(!subscription.is_closed());
    subscription.unsubscribe();
    store.set_state(|v| v + 1);

    assert!(subscription.is_closed());
    assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
  }

  #[test]
  fn guard_unsubscribes_on_drop() {
    let store = store();
    let seen = Arc::new(Mutex::new(vec![]));
    {
      let c_seen = seen.clone();
      let _guard = store.observe(move |v| c_seen.lock().unwrap().push(v)).unsubscribe_when_dropped();
      store.set_state(|v| v + 1);
    }
    store.set_state(|v| v + 1);

    assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
  }

  #[test]
  fn close_subscription() {
    let store = store();
    let calls = Arc::new(Mutex::new(0));
    let c_calls = calls.clone();
    let subscription = store.on_close(move || *c_calls.lock().unwrap() += 1);

    assert!(!subscription.is_closed());
    store.close();
    assert!(subscription.is_closed());
    assert_eq!(*calls.lock().unwrap(), 1);

    let c_calls = calls.clone();
    let mut cancelled = store.on_close(move || *c_calls.lock().unwrap() += 10);
    cancelled.unsubscribe();
    // Ran immediately on the closed store; unsubscribing afterwards is a no-op.
    assert_eq!(*calls.lock().unwrap(), 11);
  }

  #[test]
  fn outliving_the_store() {
    let store = store();
    let mut subscription = store.observe(|_| {});
    drop(store);

    assert!(subscription.is_closed());
    subscription.unsubscribe();
  }
}
