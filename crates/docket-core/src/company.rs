//! Companies and their employees.
//!
//! A company is never deleted: historical documents keep pointing at it. An
//! employee belongs to exactly one company for its whole lifetime; setting
//! `active = false` suspends the employee without losing history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Company ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
  pub company_id: Uuid,
  pub name:       String,
  /// Fiscal identifier (CIF/VAT number).
  pub tax_id:     String,
  /// ISO 3166-1 alpha-2 country code.
  pub country:    String,
  pub address:    String,
}

/// Input to [`crate::store::ComplianceStore::add_company`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCompany {
  pub name:    String,
  pub tax_id:  String,
  pub country: String,
  pub address: String,
}

impl NewCompany {
  pub fn validate(&self) -> Result<()> {
    require("name", &self.name)?;
    require("tax_id", &self.tax_id)?;
    require("country", &self.country)?;
    Ok(())
  }
}

// ─── Employee ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
  pub employee_id:     Uuid,
  /// National identity number (NIF/NIE).
  pub personal_id:     String,
  pub name:            String,
  pub surname:         Option<String>,
  pub active:          bool,
  pub country:         String,
  pub start_date:      NaiveDate,
  pub end_date:        Option<NaiveDate>,
  pub job:             String,
  pub department:      String,
  pub additional_info: Option<String>,
  pub company_id:      Uuid,
}

/// Input to [`crate::store::ComplianceStore::add_employee`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEmployee {
  pub personal_id:     String,
  pub name:            String,
  pub surname:         Option<String>,
  #[serde(default = "default_active")]
  pub active:          bool,
  pub country:         String,
  pub start_date:      NaiveDate,
  pub end_date:        Option<NaiveDate>,
  pub job:             String,
  pub department:      String,
  pub additional_info: Option<String>,
  pub company_id:      Uuid,
}

fn default_active() -> bool { true }

impl NewEmployee {
  pub fn validate(&self) -> Result<()> {
    require("personal_id", &self.personal_id)?;
    require("name", &self.name)?;
    if let Some(end) = self.end_date
      && end < self.start_date
    {
      return Err(Error::validation("end_date precedes start_date"));
    }
    Ok(())
  }
}

/// The registration flow: a new employee plus the login that will resolve to
/// them.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
  pub email:    String,
  pub password: String,
  #[serde(flatten)]
  pub employee: NewEmployee,
}

/// Stored login row: the argon2 PHC string for an employee's password.
#[derive(Debug, Clone)]
pub struct Login {
  pub employee_id:   Uuid,
  pub email:         String,
  pub password_hash: String,
}

fn require(field: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::validation(format!("{field} is required")));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn employee() -> NewEmployee {
    NewEmployee {
      personal_id:     "12345678Z".into(),
      name:            "Ana".into(),
      surname:         None,
      active:          true,
      country:         "ES".into(),
      start_date:      NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
      end_date:        None,
      job:             "Electrician".into(),
      department:      "Field".into(),
      additional_info: None,
      company_id:      Uuid::new_v4(),
    }
  }

  #[test]
  fn employee_end_before_start_is_rejected() {
    let mut e = employee();
    e.end_date = NaiveDate::from_ymd_opt(2023, 12, 31);
    assert!(matches!(e.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn company_requires_tax_id() {
    let c = NewCompany {
      name:    "Acme".into(),
      tax_id:  "  ".into(),
      country: "ES".into(),
      address: "Calle Mayor 1".into(),
    };
    assert!(matches!(c.validate(), Err(Error::Validation(m)) if m.contains("tax_id")));
  }

  #[test]
  fn registration_flattens_employee_fields() {
    let company_id = Uuid::new_v4();
    let json = serde_json::json!({
      "email": "ana@example.com",
      "password": "hunter2",
      "personal_id": "12345678Z",
      "name": "Ana",
      "country": "ES",
      "start_date": "2024-01-01",
      "job": "Electrician",
      "department": "Field",
      "company_id": company_id,
    });
    let reg: Registration = serde_json::from_value(json).unwrap();
    assert_eq!(reg.email, "ana@example.com");
    assert!(reg.employee.active);
    assert_eq!(reg.employee.company_id, company_id);
  }
}
