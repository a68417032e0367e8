//! Error types for the server-side collaborators.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// A handle that this storage could never have produced.
  #[error("malformed file handle: {0:?}")]
  BadHandle(String),

  /// Stored bytes no longer match the digest recorded in their handle.
  #[error("file {0} failed its integrity check")]
  Corrupt(String),

  #[error("jwt error: {0}")]
  Jwt(#[from] jsonwebtoken::errors::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
