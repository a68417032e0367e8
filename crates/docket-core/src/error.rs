//! Error types for `docket-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::{
  document::ValidationState,
  policy::{Action, DenyReason},
};

#[derive(Debug, Error)]
pub enum Error {
  /// No credential, a malformed one, an expired one, or one naming an
  /// inactive or unknown employee.
  #[error("unauthenticated")]
  Unauthenticated,

  #[error("forbidden: {action:?} denied ({reason})")]
  Forbidden { action: Action, reason: DenyReason },

  #[error("{kind} not found: {id}")]
  NotFound { kind: &'static str, id: String },

  #[error("relationship {contractor_id} -> {subcontractor_id} already exists")]
  DuplicateRelationship {
    contractor_id:    Uuid,
    subcontractor_id: Uuid,
  },

  #[error("a company cannot subcontract itself: {0}")]
  SelfRelationship(Uuid),

  #[error(
    "relationship {contractor_id} -> {subcontractor_id} still has {documents} document(s)"
  )]
  RelationshipInUse {
    contractor_id:    Uuid,
    subcontractor_id: Uuid,
    documents:        u64,
  },

  #[error("company {contractor_id} does not hire {subcontractor_id}")]
  UnrelatedCompanies {
    contractor_id:    Uuid,
    subcontractor_id: Uuid,
  },

  #[error("invalid transition {from:?} -> {to:?}")]
  InvalidTransition {
    from: ValidationState,
    to:   ValidationState,
  },

  #[error("document {0} changed state concurrently; re-read and retry")]
  Stale(Uuid),

  #[error("validation error: {0}")]
  Validation(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("file storage error: {0}")]
  Files(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("credential error: {0}")]
  Credentials(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
    Self::NotFound { kind, id: id.to_string() }
  }

  pub fn validation(msg: impl Into<String>) -> Self {
    Self::Validation(msg.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
