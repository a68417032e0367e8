//! Error type for `docket-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A constraint that maps onto the domain taxonomy (duplicate edge,
  /// relationship still in use, duplicate email).
  #[error("core error: {0}")]
  Core(#[from] docket_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown validation state: {0:?}")]
  UnknownState(String),
}

impl From<Error> for docket_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(core) => core,
      other => docket_core::Error::Store(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
