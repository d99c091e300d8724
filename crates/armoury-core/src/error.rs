//! Error types for `armoury-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// A required field was missing or a transition was rejected before it
  /// reached the store.
  #[error("validation error: {0}")]
  Validation(String),

  #[error("transaction not found: {0}")]
  NotFound(Uuid),

  #[error("transaction {0} is already returned")]
  AlreadyReturned(Uuid),

  #[error("weapon {0} already has an open issue record")]
  AlreadyIssued(String),

  /// The store could not be reached, or did not answer in time.
  #[error("store unavailable: {0}")]
  StoreUnavailable(String),

  /// The store answered with a row that breaks a ledger invariant.
  #[error("corrupt ledger row: {0}")]
  Corrupt(String),
}

impl Error {
  /// Whether retrying the same call may succeed.
  pub fn is_transient(&self) -> bool {
    matches!(self, Self::StoreUnavailable(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
