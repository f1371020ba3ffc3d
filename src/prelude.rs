//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Store
pub use crate::store::{StateStore, StateStoreBuilder};
// Job and listener shapes
pub use crate::jobs::{Consumer, Reducer};
pub use crate::listeners::{CloseListener, StateListener};
// Schedulers
pub use crate::scheduler::{
  ImmediateScheduler, Scheduler, SerialScheduler, Task, TestScheduler,
};
// Subscription
pub use crate::subscription::*;
// Errors
pub use crate::error::{Result, StoreError};
