use thiserror::Error;

/// Errors raised while building a store.
///
/// Operations on a live store never fail: writes and reads after
/// [`close`](crate::store::StateStore::close) are silently dropped, and a
/// panicking reducer or listener is the scheduler's business.
#[derive(Debug, Error)]
pub enum StoreError {
  /// The dedicated worker thread of the default scheduler could not be
  /// spawned.
  #[error("failed to spawn the store worker thread")]
  SpawnWorker(#[source] std::io::Error),
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
