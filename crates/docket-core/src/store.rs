//! The `ComplianceStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `docket-store-sqlite`).
//! It is deliberately dumb: it persists and queries rows and enforces the
//! uniqueness and referential constraints that need atomicity, but performs no
//! authorization. [`crate::engine::Engine`] is the only intended caller.

use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  company::{Company, Employee, Login, NewCompany, NewEmployee},
  document::{Document, ValidationState},
  relationship::Relationship,
};

/// The scoping key of a document listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentQuery {
  /// Employee-scope documents of one employee.
  Employee(Uuid),
  /// Every document (both scopes) owned by a subcontractor.
  Subcontractor(Uuid),
  /// Every document addressed to a contractor.
  Contractor(Uuid),
}

/// Abstraction over a Docket store backend.
///
/// Backend errors must convert into [`crate::Error`]; constraint failures
/// that map onto the domain taxonomy (duplicate relationship, relationship
/// still in use) should convert into the matching variant.
pub trait ComplianceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static + Into<crate::Error>;

  // ── Companies ─────────────────────────────────────────────────────────

  fn add_company(
    &self,
    input: NewCompany,
  ) -> impl Future<Output = Result<Company, Self::Error>> + Send + '_;

  fn get_company(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Company>, Self::Error>> + Send + '_;

  /// All companies, ordered by id.
  fn list_companies(&self) -> impl Future<Output = Result<Vec<Company>, Self::Error>> + Send + '_;

  // ── Employees ─────────────────────────────────────────────────────────

  /// Persist a new employee together with their login. Fails if the email is
  /// already registered.
  fn add_employee(
    &self,
    input: NewEmployee,
    email: String,
    password_hash: String,
  ) -> impl Future<Output = Result<Employee, Self::Error>> + Send + '_;

  fn get_employee(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Employee>, Self::Error>> + Send + '_;

  fn find_login<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Login>, Self::Error>> + Send + 'a;

  // ── Relationships ─────────────────────────────────────────────────────

  /// Insert a new edge. Fails with a duplicate error if the ordered pair
  /// already exists.
  fn add_relationship(
    &self,
    rel: Relationship,
  ) -> impl Future<Output = Result<Relationship, Self::Error>> + Send + '_;

  fn get_relationship(
    &self,
    contractor_id: Uuid,
    subcontractor_id: Uuid,
  ) -> impl Future<Output = Result<Option<Relationship>, Self::Error>> + Send + '_;

  /// Overwrite the attributes of an existing edge. Returns `false` if the
  /// pair does not exist.
  fn update_relationship(
    &self,
    rel: Relationship,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Hard-remove an edge. Fails with an in-use error, and removes nothing,
  /// while documents are still scoped to the pair. Returns `false` if the
  /// pair does not exist.
  fn delete_relationship(
    &self,
    contractor_id: Uuid,
    subcontractor_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Edges where `contractor_id` hires, ordered by `start_date` then
  /// subcontractor id.
  fn list_relationships_by_contractor(
    &self,
    contractor_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Relationship>, Self::Error>> + Send + '_;

  /// Edges where `subcontractor_id` is hired, ordered by `start_date` then
  /// contractor id.
  fn list_relationships_by_subcontractor(
    &self,
    subcontractor_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Relationship>, Self::Error>> + Send + '_;

  // ── Documents ─────────────────────────────────────────────────────────

  fn insert_document(
    &self,
    doc: Document,
  ) -> impl Future<Output = Result<Document, Self::Error>> + Send + '_;

  fn get_document(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + '_;

  /// Persist content fields and the file reference of `doc`. The stored
  /// `validation_state` and `validation_date` are left untouched; the
  /// returned document reflects what is stored. `None` if the id is unknown.
  fn update_document_content(
    &self,
    doc: Document,
  ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + '_;

  /// Atomically move a document from `expected` to `next`, writing
  /// `validation_date`. Returns `None`, changing nothing, if the stored state
  /// is not `expected` or the document is gone.
  fn compare_and_set_state(
    &self,
    id: Uuid,
    expected: ValidationState,
    next: ValidationState,
    validation_date: Option<NaiveDate>,
  ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + '_;

  /// Returns the deleted document, or `None` if it did not exist.
  fn delete_document(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + '_;

  /// Documents under `query`, ordered by `date` then id. No rows is an empty
  /// vector, not an error.
  fn list_documents(
    &self,
    query: DocumentQuery,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + '_;

  /// Documents with `expiration_date < today` that are not yet `EX`.
  fn list_due_for_expiry(
    &self,
    today: NaiveDate,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + '_;
}
