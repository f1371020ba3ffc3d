//! # statestore: observable state without locks at the call site
//!
//! A [`StateStore<T>`] holds one value that many threads can read, transform
//! and observe. Callers queue reads ([`with_state`]) and pure writes
//! ([`set_state`]); the store drains the queue on its own scheduler, folds
//! every pending write into a single transition and tells its listeners only
//! about states that actually changed.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::mpsc;
//!
//! use statestore::prelude::*;
//!
//! // Flush passes run on a dedicated worker thread.
//! let store = StateStore::new(String::from("hello")).unwrap();
//!
//! let (tx, rx) = mpsc::channel();
//! let subscription = store.observe(move |s: String| tx.send(s).unwrap());
//!
//! store.set_state(|s| s + " world");
//! assert_eq!(rx.recv().unwrap(), "hello");
//! assert_eq!(rx.recv().unwrap(), "hello world");
//!
//! drop(subscription);
//! store.close();
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`StateStore`] | The container: queue, flush pass, listeners, close |
//! | [`Scheduler`] | Where flush passes and notifications run |
//! | [`SubscriptionLike`] | Handle to cancel a listener registration |
//! | [`defaults`] | Process-wide default schedulers |
//!
//! [`StateStore<T>`]: store::StateStore
//! [`StateStore`]: store::StateStore
//! [`with_state`]: store::StateStore::with_state
//! [`set_state`]: store::StateStore::set_state
//! [`Scheduler`]: scheduler::Scheduler
//! [`SubscriptionLike`]: subscription::SubscriptionLike

pub mod defaults;
pub mod error;
mod jobs;
mod listeners;
pub mod prelude;
pub mod scheduler;
pub mod store;
pub mod subscription;

// Re-export the prelude module
pub use prelude::*;
