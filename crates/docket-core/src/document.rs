//! Compliance documents and their validation state.
//!
//! A document is exchanged between a contractor and a subcontractor it hires.
//! It is either *company-scope* (about the subcontractor as a whole) or
//! *employee-scope* (about one of the subcontractor's employees).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, storage::FileHandle};

// ─── ValidationState ─────────────────────────────────────────────────────────

/// Lifecycle tag of a document. Closed set; see [`crate::lifecycle`] for the
/// transitions between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationState {
  /// Pending validation. Every document starts here.
  #[serde(rename = "VA")]
  Pending,
  #[serde(rename = "OK")]
  Validated,
  #[serde(rename = "ER")]
  Rejected,
  #[serde(rename = "EX")]
  Expired,
}

impl ValidationState {
  /// The two-letter code used on the wire and in the database.
  pub fn code(self) -> &'static str {
    match self {
      Self::Pending => "VA",
      Self::Validated => "OK",
      Self::Rejected => "ER",
      Self::Expired => "EX",
    }
  }

  pub fn from_code(code: &str) -> Option<Self> {
    match code {
      "VA" => Some(Self::Pending),
      "OK" => Some(Self::Validated),
      "ER" => Some(Self::Rejected),
      "EX" => Some(Self::Expired),
      _ => None,
    }
  }

  /// States that carry a `validation_date`.
  pub fn is_decided(self) -> bool { matches!(self, Self::Validated | Self::Rejected) }
}

// ─── Document ────────────────────────────────────────────────────────────────

/// The attachment currently bound to a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
  pub handle:    FileHandle,
  /// The name the file was uploaded under.
  pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
  pub document_id:      Uuid,
  pub validation_state: ValidationState,
  pub contractor_id:    Uuid,
  pub subcontractor_id: Uuid,
  pub name:             String,
  pub date:             NaiveDate,
  pub expiration_date:  Option<NaiveDate>,
  /// Set iff `validation_state` is `OK` or `ER`.
  pub validation_date:  Option<NaiveDate>,
  /// `None` for company-scope documents.
  pub employee_id:      Option<Uuid>,
  pub additional_info:  Option<String>,
  pub file:             Option<FileRef>,
}

impl Document {
  /// Build a fresh `VA` document from a creation request.
  pub fn from_request(document_id: Uuid, req: NewDocumentRequest) -> Self {
    Self {
      document_id,
      validation_state: ValidationState::Pending,
      contractor_id: req.contractor_id,
      subcontractor_id: req.subcontractor_id,
      name: req.name,
      date: req.date,
      expiration_date: req.expiration_date,
      validation_date: None,
      employee_id: req.employee_id,
      additional_info: req.additional_info,
      file: None,
    }
  }

  /// Overwrite the mutable content fields. State, scope and the company pair
  /// are never touched here.
  pub fn apply_update(&mut self, req: UpdateDocumentRequest) {
    self.name = req.name;
    self.date = req.date;
    self.expiration_date = req.expiration_date;
    self.additional_info = req.additional_info;
  }
}

// ─── Requests ────────────────────────────────────────────────────────────────

/// Creation request. The document always starts in `VA`; callers cannot
/// choose a state or a validation date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocumentRequest {
  pub contractor_id:    Uuid,
  pub subcontractor_id: Uuid,
  pub name:             String,
  pub date:             NaiveDate,
  pub expiration_date:  Option<NaiveDate>,
  pub employee_id:      Option<Uuid>,
  pub additional_info:  Option<String>,
}

impl NewDocumentRequest {
  pub fn validate(&self) -> Result<()> {
    validate_content(&self.name, self.date, self.expiration_date)
  }
}

/// Full overwrite of a document's content. Every field is required; absent
/// optional fields clear the stored value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDocumentRequest {
  pub name:            String,
  pub date:            NaiveDate,
  pub expiration_date: Option<NaiveDate>,
  pub additional_info: Option<String>,
}

impl UpdateDocumentRequest {
  pub fn validate(&self) -> Result<()> {
    validate_content(&self.name, self.date, self.expiration_date)
  }
}

fn validate_content(
  name: &str,
  date: NaiveDate,
  expiration_date: Option<NaiveDate>,
) -> Result<()> {
  if name.trim().is_empty() {
    return Err(Error::validation("name is required"));
  }
  if let Some(exp) = expiration_date
    && exp < date
  {
    return Err(Error::validation("expiration_date precedes date"));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn request() -> NewDocumentRequest {
    NewDocumentRequest {
      contractor_id:    Uuid::new_v4(),
      subcontractor_id: Uuid::new_v4(),
      name:             "Insurance".into(),
      date:             date(2024, 1, 15),
      expiration_date:  Some(date(2024, 6, 1)),
      employee_id:      None,
      additional_info:  None,
    }
  }

  #[test]
  fn state_codes_roundtrip_through_serde() {
    for state in [
      ValidationState::Pending,
      ValidationState::Validated,
      ValidationState::Rejected,
      ValidationState::Expired,
    ] {
      let json = serde_json::to_string(&state).unwrap();
      assert_eq!(json, format!("\"{}\"", state.code()));
      assert_eq!(ValidationState::from_code(state.code()), Some(state));
    }
    assert_eq!(ValidationState::from_code("XX"), None);
  }

  #[test]
  fn new_document_starts_pending_without_validation_date() {
    let doc = Document::from_request(Uuid::new_v4(), request());
    assert_eq!(doc.validation_state, ValidationState::Pending);
    assert_eq!(doc.validation_date, None);
    assert_eq!(doc.employee_id, None);
  }

  #[test]
  fn expiration_before_date_is_rejected() {
    let mut req = request();
    req.expiration_date = Some(date(2024, 1, 14));
    assert!(matches!(req.validate(), Err(Error::Validation(_))));

    req.expiration_date = Some(req.date);
    assert!(req.validate().is_ok());
  }

  #[test]
  fn update_leaves_state_and_scope_alone() {
    let employee = Uuid::new_v4();
    let mut req = request();
    req.employee_id = Some(employee);
    let mut doc = Document::from_request(Uuid::new_v4(), req);
    doc.validation_state = ValidationState::Validated;
    doc.validation_date = Some(date(2024, 2, 1));

    doc.apply_update(UpdateDocumentRequest {
      name:            "Insurance 2024".into(),
      date:            date(2024, 2, 2),
      expiration_date: None,
      additional_info: Some("renewed".into()),
    });

    assert_eq!(doc.name, "Insurance 2024");
    assert_eq!(doc.expiration_date, None);
    assert_eq!(doc.validation_state, ValidationState::Validated);
    assert_eq!(doc.validation_date, Some(date(2024, 2, 1)));
    assert_eq!(doc.employee_id, Some(employee));
  }
}
