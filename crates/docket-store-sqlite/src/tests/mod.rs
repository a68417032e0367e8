//! Integration tests for `SqliteStore` and for the `Engine` running on top of
//! it, against an in-memory database.

mod store;

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use docket_core::{
  clock::FixedClock,
  company::{NewCompany, NewEmployee},
  engine::Engine,
  identity::{Credential, CredentialProvider, DecodedCredential, IssuedCredential},
  storage::MemoryFileStorage,
  store::ComplianceStore,
};
use uuid::Uuid;

use crate::SqliteStore;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

pub fn new_company(name: &str) -> NewCompany {
  NewCompany {
    name:    name.into(),
    tax_id:  format!("TAX-{name}"),
    country: "ES".into(),
    address: "Calle Mayor 1".into(),
  }
}

pub fn new_employee(company_id: Uuid, name: &str) -> NewEmployee {
  NewEmployee {
    personal_id:     format!("ID-{name}"),
    name:            name.into(),
    surname:         None,
    active:          true,
    country:         "ES".into(),
    start_date:      date(2023, 1, 1),
    end_date:        None,
    job:             "Technician".into(),
    department:      "Operations".into(),
    additional_info: None,
    company_id,
  }
}

// ─── Credentials ─────────────────────────────────────────────────────────────

/// Token format: `<employee uuid>:<expiry unix seconds>`.
pub struct PlainTokens;

impl CredentialProvider for PlainTokens {
  fn decode(&self, token: &str) -> Option<DecodedCredential> {
    let (id, exp) = token.split_once(':')?;
    Some(DecodedCredential {
      employee_id: id.parse().ok()?,
      expires_at:  Utc.timestamp_opt(exp.parse().ok()?, 0).single()?,
    })
  }

  fn issue(
    &self,
    employee_id: Uuid,
    now: DateTime<Utc>,
  ) -> docket_core::Result<IssuedCredential> {
    let expires_at = now + Duration::hours(1);
    Ok(IssuedCredential {
      token: format!("{employee_id}:{}", expires_at.timestamp()),
      employee_id,
      expires_at,
    })
  }
}

/// A credential for `employee_id` that outlives every clock used here.
pub fn credential_for(employee_id: Uuid) -> Credential {
  let far = Utc.with_ymd_and_hms(2100, 1, 1, 0, 0, 0).unwrap();
  Credential::new(format!("{employee_id}:{}", far.timestamp()))
}

// ─── Engine harness ──────────────────────────────────────────────────────────

pub type TestEngine = Engine<SqliteStore, MemoryFileStorage>;

pub struct Harness {
  pub engine: TestEngine,
  pub clock:  Arc<FixedClock>,
}

impl Harness {
  pub async fn at(today: NaiveDate) -> Self {
    let clock = Arc::new(FixedClock::at_date(today));
    let engine = Engine::new(
      Arc::new(store().await),
      Arc::new(MemoryFileStorage::new()),
      Arc::new(PlainTokens),
      clock.clone(),
    );
    Self { engine, clock }
  }

  /// A company with one active employee; returns `(company_id, credential,
  /// employee_id)`.
  pub async fn company_with_employee(&self, name: &str) -> (Uuid, Credential, Uuid) {
    let store = self.engine.store();
    let company = store.add_company(new_company(name)).await.unwrap();
    let employee = store
      .add_employee(
        new_employee(company.company_id, name),
        format!("{}@example.com", name.to_lowercase()),
        "unused".into(),
      )
      .await
      .unwrap();
    (company.company_id, credential_for(employee.employee_id), employee.employee_id)
  }
}
