//! [`SqliteStore`], the SQLite implementation of [`ComplianceStore`].

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use docket_core::{
  company::{Company, Employee, Login, NewCompany, NewEmployee},
  document::{Document, ValidationState},
  relationship::Relationship,
  store::{ComplianceStore, DocumentQuery},
};

use crate::{
  Error, Result,
  encode::{
    COMPANY_COLUMNS, DOCUMENT_COLUMNS, EMPLOYEE_COLUMNS, RELATIONSHIP_COLUMNS, RawCompany,
    RawDocument, RawEmployee, RawLogin, RawRelationship, encode_date, encode_state, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Docket compliance store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Outcome of a relationship removal, decided inside one connection call.
enum Removal {
  Missing,
  InUse(u64),
  Removed,
}

fn select_document(
  conn: &rusqlite::Connection,
  id: &str,
) -> rusqlite::Result<Option<RawDocument>> {
  conn
    .query_row(
      &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE document_id = ?1"),
      rusqlite::params![id],
      RawDocument::from_row,
    )
    .optional()
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn documents_where(&self, clause: &'static str, param: String) -> Result<Vec<Document>> {
    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE {clause} ORDER BY date, document_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![param], RawDocument::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDocument::into_document).collect()
  }

  async fn relationships_where(
    &self,
    clause: &'static str,
    order: &'static str,
    id: Uuid,
  ) -> Result<Vec<Relationship>> {
    let id_str = encode_uuid(id);

    let raws: Vec<RawRelationship> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RELATIONSHIP_COLUMNS} FROM relationships WHERE {clause} ORDER BY {order}"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawRelationship::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRelationship::into_relationship).collect()
  }
}

// ─── ComplianceStore impl ────────────────────────────────────────────────────

impl ComplianceStore for SqliteStore {
  type Error = Error;

  // ── Companies ─────────────────────────────────────────────────────────────

  async fn add_company(&self, input: NewCompany) -> Result<Company> {
    let company = Company {
      company_id: Uuid::new_v4(),
      name:       input.name,
      tax_id:     input.tax_id,
      country:    input.country,
      address:    input.address,
    };

    let id_str  = encode_uuid(company.company_id);
    let name    = company.name.clone();
    let tax_id  = company.tax_id.clone();
    let country = company.country.clone();
    let address = company.address.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO companies (company_id, name, tax_id, country, address)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, name, tax_id, country, address],
        )?;
        Ok(())
      })
      .await?;

    Ok(company)
  }

  async fn get_company(&self, id: Uuid) -> Result<Option<Company>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawCompany> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE company_id = ?1"),
              rusqlite::params![id_str],
              RawCompany::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCompany::into_company).transpose()
  }

  async fn list_companies(&self) -> Result<Vec<Company>> {
    let raws: Vec<RawCompany> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {COMPANY_COLUMNS} FROM companies ORDER BY company_id"))?;
        let rows = stmt
          .query_map([], RawCompany::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCompany::into_company).collect()
  }

  // ── Employees ─────────────────────────────────────────────────────────────

  async fn add_employee(
    &self,
    input: NewEmployee,
    email: String,
    password_hash: String,
  ) -> Result<Employee> {
    let employee = Employee {
      employee_id:     Uuid::new_v4(),
      personal_id:     input.personal_id,
      name:            input.name,
      surname:         input.surname,
      active:          input.active,
      country:         input.country,
      start_date:      input.start_date,
      end_date:        input.end_date,
      job:             input.job,
      department:      input.department,
      additional_info: input.additional_info,
      company_id:      input.company_id,
    };

    let id_str      = encode_uuid(employee.employee_id);
    let company_str = encode_uuid(employee.company_id);
    let start_str   = encode_date(employee.start_date);
    let end_str     = employee.end_date.map(encode_date);
    let row         = employee.clone();
    let login_email = email.clone();

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let taken: bool = tx
          .query_row(
            "SELECT 1 FROM logins WHERE email = ?1",
            rusqlite::params![login_email],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(false);
        }

        tx.execute(
          &format!(
            "INSERT INTO employees ({EMPLOYEE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
          ),
          rusqlite::params![
            id_str,
            row.personal_id,
            row.name,
            row.surname,
            row.active,
            row.country,
            start_str,
            end_str,
            row.job,
            row.department,
            row.additional_info,
            company_str,
          ],
        )?;
        tx.execute(
          "INSERT INTO logins (email, employee_id, password_hash) VALUES (?1, ?2, ?3)",
          rusqlite::params![login_email, id_str, password_hash],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::Core(docket_core::Error::validation(format!(
        "email {email} is already registered"
      ))));
    }
    Ok(employee)
  }

  async fn get_employee(&self, id: Uuid) -> Result<Option<Employee>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawEmployee> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE employee_id = ?1"),
              rusqlite::params![id_str],
              RawEmployee::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEmployee::into_employee).transpose()
  }

  async fn find_login<'a>(&'a self, email: &'a str) -> Result<Option<Login>> {
    let email = email.to_owned();

    let raw: Option<RawLogin> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT email, employee_id, password_hash FROM logins WHERE email = ?1",
              rusqlite::params![email],
              |row| {
                Ok(RawLogin {
                  email:         row.get(0)?,
                  employee_id:   row.get(1)?,
                  password_hash: row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawLogin::into_login).transpose()
  }

  // ── Relationships ─────────────────────────────────────────────────────────

  async fn add_relationship(&self, rel: Relationship) -> Result<Relationship> {
    let contractor_str = encode_uuid(rel.contractor_id);
    let sub_str        = encode_uuid(rel.subcontractor_id);
    let start_str      = encode_date(rel.start_date);
    let end_str        = rel.end_date.map(encode_date);
    let info           = rel.additional_info.clone();

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let exists: bool = conn
          .query_row(
            "SELECT 1 FROM relationships WHERE contractor_id = ?1 AND subcontractor_id = ?2",
            rusqlite::params![contractor_str, sub_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if exists {
          return Ok(false);
        }

        conn.execute(
          &format!("INSERT INTO relationships ({RELATIONSHIP_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
          rusqlite::params![contractor_str, sub_str, start_str, end_str, info],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::Core(docket_core::Error::DuplicateRelationship {
        contractor_id:    rel.contractor_id,
        subcontractor_id: rel.subcontractor_id,
      }));
    }
    Ok(rel)
  }

  async fn get_relationship(
    &self,
    contractor_id: Uuid,
    subcontractor_id: Uuid,
  ) -> Result<Option<Relationship>> {
    let contractor_str = encode_uuid(contractor_id);
    let sub_str        = encode_uuid(subcontractor_id);

    let raw: Option<RawRelationship> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {RELATIONSHIP_COLUMNS} FROM relationships
                 WHERE contractor_id = ?1 AND subcontractor_id = ?2"
              ),
              rusqlite::params![contractor_str, sub_str],
              RawRelationship::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRelationship::into_relationship).transpose()
  }

  async fn update_relationship(&self, rel: Relationship) -> Result<bool> {
    let contractor_str = encode_uuid(rel.contractor_id);
    let sub_str        = encode_uuid(rel.subcontractor_id);
    let start_str      = encode_date(rel.start_date);
    let end_str        = rel.end_date.map(encode_date);
    let info           = rel.additional_info;

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE relationships SET start_date = ?3, end_date = ?4, additional_info = ?5
           WHERE contractor_id = ?1 AND subcontractor_id = ?2",
          rusqlite::params![contractor_str, sub_str, start_str, end_str, info],
        )?)
      })
      .await?;

    Ok(changed == 1)
  }

  async fn delete_relationship(&self, contractor_id: Uuid, subcontractor_id: Uuid) -> Result<bool> {
    let contractor_str = encode_uuid(contractor_id);
    let sub_str        = encode_uuid(subcontractor_id);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let documents: i64 = tx.query_row(
          "SELECT COUNT(*) FROM documents WHERE contractor_id = ?1 AND subcontractor_id = ?2",
          rusqlite::params![contractor_str, sub_str],
          |r| r.get(0),
        )?;
        if documents > 0 {
          return Ok(Removal::InUse(documents as u64));
        }

        let removed = tx.execute(
          "DELETE FROM relationships WHERE contractor_id = ?1 AND subcontractor_id = ?2",
          rusqlite::params![contractor_str, sub_str],
        )?;
        tx.commit()?;
        Ok(if removed == 1 { Removal::Removed } else { Removal::Missing })
      })
      .await?;

    match outcome {
      Removal::Removed => Ok(true),
      Removal::Missing => Ok(false),
      Removal::InUse(documents) => Err(Error::Core(docket_core::Error::RelationshipInUse {
        contractor_id,
        subcontractor_id,
        documents,
      })),
    }
  }

  async fn list_relationships_by_contractor(&self, contractor_id: Uuid) -> Result<Vec<Relationship>> {
    self
      .relationships_where("contractor_id = ?1", "start_date, subcontractor_id", contractor_id)
      .await
  }

  async fn list_relationships_by_subcontractor(
    &self,
    subcontractor_id: Uuid,
  ) -> Result<Vec<Relationship>> {
    self
      .relationships_where("subcontractor_id = ?1", "start_date, contractor_id", subcontractor_id)
      .await
  }

  // ── Documents ─────────────────────────────────────────────────────────────

  async fn insert_document(&self, doc: Document) -> Result<Document> {
    let id_str         = encode_uuid(doc.document_id);
    let state_str      = encode_state(doc.validation_state);
    let contractor_str = encode_uuid(doc.contractor_id);
    let sub_str        = encode_uuid(doc.subcontractor_id);
    let name           = doc.name.clone();
    let date_str       = encode_date(doc.date);
    let exp_str        = doc.expiration_date.map(encode_date);
    let val_str        = doc.validation_date.map(encode_date);
    let employee_str   = doc.employee_id.map(encode_uuid);
    let info           = doc.additional_info.clone();
    let file_handle    = doc.file.as_ref().map(|f| f.handle.0.clone());
    let file_name      = doc.file.as_ref().map(|f| f.file_name.clone());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO documents ({DOCUMENT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
          ),
          rusqlite::params![
            id_str,
            state_str,
            contractor_str,
            sub_str,
            name,
            date_str,
            exp_str,
            val_str,
            employee_str,
            info,
            file_handle,
            file_name,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(doc)
  }

  async fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| Ok(select_document(conn, &id_str)?))
      .await?;

    raw.map(RawDocument::into_document).transpose()
  }

  async fn update_document_content(&self, doc: Document) -> Result<Option<Document>> {
    let id_str      = encode_uuid(doc.document_id);
    let date_str    = encode_date(doc.date);
    let exp_str     = doc.expiration_date.map(encode_date);
    let file_handle = doc.file.as_ref().map(|f| f.handle.0.clone());
    let file_name   = doc.file.as_ref().map(|f| f.file_name.clone());
    let name        = doc.name;
    let info        = doc.additional_info;

    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE documents
           SET name = ?2, date = ?3, expiration_date = ?4, additional_info = ?5,
               file_handle = ?6, file_name = ?7
           WHERE document_id = ?1",
          rusqlite::params![id_str, name, date_str, exp_str, info, file_handle, file_name],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(select_document(conn, &id_str)?)
      })
      .await?;

    raw.map(RawDocument::into_document).transpose()
  }

  async fn compare_and_set_state(
    &self,
    id: Uuid,
    expected: ValidationState,
    next: ValidationState,
    validation_date: Option<NaiveDate>,
  ) -> Result<Option<Document>> {
    let id_str       = encode_uuid(id);
    let expected_str = encode_state(expected);
    let next_str     = encode_state(next);
    let date_str     = validation_date.map(encode_date);

    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE documents SET validation_state = ?3, validation_date = ?4
           WHERE document_id = ?1 AND validation_state = ?2",
          rusqlite::params![id_str, expected_str, next_str, date_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(select_document(conn, &id_str)?)
      })
      .await?;

    raw.map(RawDocument::into_document).transpose()
  }

  async fn delete_document(&self, id: Uuid) -> Result<Option<Document>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(raw) = select_document(&tx, &id_str)? else {
          return Ok(None);
        };
        tx.execute("DELETE FROM documents WHERE document_id = ?1", rusqlite::params![id_str])?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    raw.map(RawDocument::into_document).transpose()
  }

  async fn list_documents(&self, query: DocumentQuery) -> Result<Vec<Document>> {
    match query {
      DocumentQuery::Employee(id) => self.documents_where("employee_id = ?1", encode_uuid(id)).await,
      DocumentQuery::Subcontractor(id) => {
        self.documents_where("subcontractor_id = ?1", encode_uuid(id)).await
      }
      DocumentQuery::Contractor(id) => {
        self.documents_where("contractor_id = ?1", encode_uuid(id)).await
      }
    }
  }

  async fn list_due_for_expiry(&self, today: NaiveDate) -> Result<Vec<Document>> {
    self
      .documents_where(
        "expiration_date IS NOT NULL AND expiration_date < ?1 AND validation_state != 'EX'",
        encode_date(today),
      )
      .await
  }
}
