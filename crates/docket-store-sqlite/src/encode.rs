//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Calendar dates are stored as `YYYY-MM-DD` so that lexicographic order in
//! SQL matches chronological order. UUIDs are stored as hyphenated lowercase
//! strings, whose lexicographic order matches [`Uuid`]'s `Ord`.

use chrono::NaiveDate;
use docket_core::{
  company::{Company, Employee, Login},
  document::{Document, FileRef, ValidationState},
  relationship::Relationship,
  storage::FileHandle,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── NaiveDate ───────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

fn decode_opt_date(s: Option<String>) -> Result<Option<NaiveDate>> {
  s.as_deref().map(decode_date).transpose()
}

// ─── ValidationState ─────────────────────────────────────────────────────────

pub fn encode_state(s: ValidationState) -> &'static str { s.code() }

pub fn decode_state(s: &str) -> Result<ValidationState> {
  ValidationState::from_code(s).ok_or_else(|| Error::UnknownState(s.to_owned()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `companies` row.
pub struct RawCompany {
  pub company_id: String,
  pub name:       String,
  pub tax_id:     String,
  pub country:    String,
  pub address:    String,
}

pub const COMPANY_COLUMNS: &str = "company_id, name, tax_id, country, address";

impl RawCompany {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      company_id: row.get(0)?,
      name:       row.get(1)?,
      tax_id:     row.get(2)?,
      country:    row.get(3)?,
      address:    row.get(4)?,
    })
  }

  pub fn into_company(self) -> Result<Company> {
    Ok(Company {
      company_id: decode_uuid(&self.company_id)?,
      name:       self.name,
      tax_id:     self.tax_id,
      country:    self.country,
      address:    self.address,
    })
  }
}

/// Raw values read directly from an `employees` row.
pub struct RawEmployee {
  pub employee_id:     String,
  pub personal_id:     String,
  pub name:            String,
  pub surname:         Option<String>,
  pub active:          bool,
  pub country:         String,
  pub start_date:      String,
  pub end_date:        Option<String>,
  pub job:             String,
  pub department:      String,
  pub additional_info: Option<String>,
  pub company_id:      String,
}

pub const EMPLOYEE_COLUMNS: &str = "employee_id, personal_id, name, surname, active, country, \
                                    start_date, end_date, job, department, additional_info, \
                                    company_id";

impl RawEmployee {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      employee_id:     row.get(0)?,
      personal_id:     row.get(1)?,
      name:            row.get(2)?,
      surname:         row.get(3)?,
      active:          row.get(4)?,
      country:         row.get(5)?,
      start_date:      row.get(6)?,
      end_date:        row.get(7)?,
      job:             row.get(8)?,
      department:      row.get(9)?,
      additional_info: row.get(10)?,
      company_id:      row.get(11)?,
    })
  }

  pub fn into_employee(self) -> Result<Employee> {
    Ok(Employee {
      employee_id:     decode_uuid(&self.employee_id)?,
      personal_id:     self.personal_id,
      name:            self.name,
      surname:         self.surname,
      active:          self.active,
      country:         self.country,
      start_date:      decode_date(&self.start_date)?,
      end_date:        decode_opt_date(self.end_date)?,
      job:             self.job,
      department:      self.department,
      additional_info: self.additional_info,
      company_id:      decode_uuid(&self.company_id)?,
    })
  }
}

/// Raw values read directly from a `logins` row.
pub struct RawLogin {
  pub email:         String,
  pub employee_id:   String,
  pub password_hash: String,
}

impl RawLogin {
  pub fn into_login(self) -> Result<Login> {
    Ok(Login {
      employee_id:   decode_uuid(&self.employee_id)?,
      email:         self.email,
      password_hash: self.password_hash,
    })
  }
}

/// Raw values read directly from a `relationships` row.
pub struct RawRelationship {
  pub contractor_id:    String,
  pub subcontractor_id: String,
  pub start_date:       String,
  pub end_date:         Option<String>,
  pub additional_info:  Option<String>,
}

pub const RELATIONSHIP_COLUMNS: &str =
  "contractor_id, subcontractor_id, start_date, end_date, additional_info";

impl RawRelationship {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      contractor_id:    row.get(0)?,
      subcontractor_id: row.get(1)?,
      start_date:       row.get(2)?,
      end_date:         row.get(3)?,
      additional_info:  row.get(4)?,
    })
  }

  pub fn into_relationship(self) -> Result<Relationship> {
    Ok(Relationship {
      contractor_id:    decode_uuid(&self.contractor_id)?,
      subcontractor_id: decode_uuid(&self.subcontractor_id)?,
      start_date:       decode_date(&self.start_date)?,
      end_date:         decode_opt_date(self.end_date)?,
      additional_info:  self.additional_info,
    })
  }
}

/// Raw values read directly from a `documents` row.
pub struct RawDocument {
  pub document_id:      String,
  pub validation_state: String,
  pub contractor_id:    String,
  pub subcontractor_id: String,
  pub name:             String,
  pub date:             String,
  pub expiration_date:  Option<String>,
  pub validation_date:  Option<String>,
  pub employee_id:      Option<String>,
  pub additional_info:  Option<String>,
  pub file_handle:      Option<String>,
  pub file_name:        Option<String>,
}

pub const DOCUMENT_COLUMNS: &str = "document_id, validation_state, contractor_id, \
                                    subcontractor_id, name, date, expiration_date, \
                                    validation_date, employee_id, additional_info, \
                                    file_handle, file_name";

impl RawDocument {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      document_id:      row.get(0)?,
      validation_state: row.get(1)?,
      contractor_id:    row.get(2)?,
      subcontractor_id: row.get(3)?,
      name:             row.get(4)?,
      date:             row.get(5)?,
      expiration_date:  row.get(6)?,
      validation_date:  row.get(7)?,
      employee_id:      row.get(8)?,
      additional_info:  row.get(9)?,
      file_handle:      row.get(10)?,
      file_name:        row.get(11)?,
    })
  }

  pub fn into_document(self) -> Result<Document> {
    let file = match (self.file_handle, self.file_name) {
      (Some(handle), Some(file_name)) => Some(FileRef { handle: FileHandle(handle), file_name }),
      _ => None,
    };

    Ok(Document {
      document_id: decode_uuid(&self.document_id)?,
      validation_state: decode_state(&self.validation_state)?,
      contractor_id: decode_uuid(&self.contractor_id)?,
      subcontractor_id: decode_uuid(&self.subcontractor_id)?,
      name: self.name,
      date: decode_date(&self.date)?,
      expiration_date: decode_opt_date(self.expiration_date)?,
      validation_date: decode_opt_date(self.validation_date)?,
      employee_id: self.employee_id.as_deref().map(decode_uuid).transpose()?,
      additional_info: self.additional_info,
      file,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dates_sort_chronologically_as_text() {
    let a = encode_date(NaiveDate::from_ymd_opt(2024, 9, 30).unwrap());
    let b = encode_date(NaiveDate::from_ymd_opt(2024, 10, 1).unwrap());
    assert!(a < b);
    assert_eq!(decode_date(&b).unwrap(), NaiveDate::from_ymd_opt(2024, 10, 1).unwrap());
  }

  #[test]
  fn unknown_state_is_an_error() {
    assert!(matches!(decode_state("ZZ"), Err(Error::UnknownState(s)) if s == "ZZ"));
    assert_eq!(decode_state("EX").unwrap(), ValidationState::Expired);
  }

  #[test]
  fn uuid_text_order_matches_uuid_order() {
    let mut ids: Vec<Uuid> = (0..16).map(|_| Uuid::new_v4()).collect();
    let mut texts: Vec<String> = ids.iter().copied().map(encode_uuid).collect();
    ids.sort();
    texts.sort();
    let decoded: Vec<Uuid> = texts.iter().map(|t| decode_uuid(t).unwrap()).collect();
    assert_eq!(decoded, ids);
  }
}
