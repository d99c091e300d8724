//! Error type for `armoury-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A ledger rule refused the operation (not found, already returned, …).
  #[error(transparent)]
  Core(#[from] armoury_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

impl From<Error> for armoury_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::Core(core) => core,
      Error::Database(e) => Self::StoreUnavailable(e.to_string()),
      Error::Uuid(e) => Self::Corrupt(e.to_string()),
      Error::DateParse(msg) => Self::Corrupt(msg),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
