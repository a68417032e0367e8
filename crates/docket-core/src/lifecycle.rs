//! The validation lifecycle of a document.
//!
//! ```text
//!   VA ──human──▶ OK ◀─┐
//!    │            │    │ human (revise decision)
//!    └──human──▶ ER ◀──┘
//!   VA | OK | ER ──sweep──▶ EX   (irreversible)
//! ```
//!
//! Humans (contractor side only, see [`crate::policy`]) may only request `OK`
//! or `ER`. `EX` is reached exclusively through the expiration sweep and
//! nothing ever leaves it.

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  document::{Document, ValidationState},
};

/// Check a human-requested transition.
pub fn check_human_transition(from: ValidationState, to: ValidationState) -> Result<()> {
  use ValidationState::*;
  match (from, to) {
    (Expired, _) => Err(Error::InvalidTransition { from, to }),
    (_, Validated | Rejected) => Ok(()),
    (_, Pending | Expired) => Err(Error::InvalidTransition { from, to }),
  }
}

/// The `validation_date` a document carries after entering `state` on
/// `today`.
pub fn validation_date_for(state: ValidationState, today: NaiveDate) -> Option<NaiveDate> {
  state.is_decided().then_some(today)
}

/// `true` if the sweep should expire `doc` on `today`.
pub fn is_due(doc: &Document, today: NaiveDate) -> bool {
  doc.validation_state != ValidationState::Expired
    && doc.expiration_date.is_some_and(|exp| exp < today)
}

/// `validation_date` is set iff the state is `OK` or `ER`.
pub fn holds_date_invariant(doc: &Document) -> bool {
  doc.validation_date.is_some() == doc.validation_state.is_decided()
}

/// Outcome of one expiration sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
  pub today:   Option<NaiveDate>,
  /// Documents this run moved to `EX`.
  pub expired: Vec<Uuid>,
  /// Candidates whose state changed under us; they are left for the next run.
  pub skipped: Vec<Uuid>,
}

impl SweepReport {
  pub fn is_noop(&self) -> bool { self.expired.is_empty() }
}
