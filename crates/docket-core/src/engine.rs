//! [`Engine`], the entry point for every operation on companies,
//! relationships and documents.
//!
//! Each privileged call takes the caller's [`Credential`] explicitly,
//! re-resolves it against the clock, consults the access policy, and only then
//! touches the store. Lifecycle transitions go through a compare-and-set on
//! the stored state so that a concurrent expiration sweep is detected rather
//! than overwritten.

use std::{collections::HashMap, sync::Arc};

use uuid::Uuid;

use crate::{
  Error, Result,
  clock::Clock,
  company::{Company, Employee, NewCompany, Registration},
  document::{Document, FileRef, NewDocumentRequest, UpdateDocumentRequest, ValidationState},
  identity::{self, Actor, Credential, CredentialProvider, IssuedCredential},
  lifecycle::{self, SweepReport},
  password,
  policy::{self, Action, Decision, GraphFacts, Target},
  relationship::{NewRelationship, Relationship, RelationshipKey, RelationshipPatch},
  storage::FileStorage,
  store::{ComplianceStore, DocumentQuery},
};

/// Lift a backend result into the core error type.
trait IntoCore<T> {
  fn into_core(self) -> Result<T>;
}

impl<T, E: Into<Error>> IntoCore<T> for std::result::Result<T, E> {
  fn into_core(self) -> Result<T> { self.map_err(Into::into) }
}

fn files_error<E: std::error::Error + Send + Sync + 'static>(e: E) -> Error {
  Error::Files(Box::new(e))
}

pub struct Engine<S, F> {
  store:       Arc<S>,
  files:       Arc<F>,
  credentials: Arc<dyn CredentialProvider>,
  clock:       Arc<dyn Clock>,
}

impl<S, F> Clone for Engine<S, F> {
  fn clone(&self) -> Self {
    Self {
      store:       self.store.clone(),
      files:       self.files.clone(),
      credentials: self.credentials.clone(),
      clock:       self.clock.clone(),
    }
  }
}

impl<S, F> Engine<S, F>
where
  S: ComplianceStore,
  F: FileStorage,
{
  pub fn new(
    store: Arc<S>,
    files: Arc<F>,
    credentials: Arc<dyn CredentialProvider>,
    clock: Arc<dyn Clock>,
  ) -> Self {
    Self { store, files, credentials, clock }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn files(&self) -> &F { &self.files }

  // ── Identity ──────────────────────────────────────────────────────────────

  /// Resolve `credential` to the acting employee and their company.
  ///
  /// Unknown and inactive employees are treated exactly like a bad token.
  pub async fn resolve_actor(&self, credential: &Credential) -> Result<Actor> {
    let employee_id =
      identity::resolve_employee(credential, &*self.credentials, self.clock.now())?;
    match self.store.get_employee(employee_id).await.into_core()? {
      Some(e) if e.active => Ok(Actor { employee_id: e.employee_id, company_id: e.company_id }),
      _ => Err(Error::Unauthenticated),
    }
  }

  /// Registration flow: create an employee of an existing company together
  /// with their login.
  pub async fn register(&self, registration: Registration) -> Result<Employee> {
    let Registration { email, password, employee } = registration;
    employee.validate()?;
    let email = normalize_email(&email)?;
    self.require_company(employee.company_id).await?;
    let hash = password::hash_password(&password)?;

    let employee = self.store.add_employee(employee, email, hash).await.into_core()?;
    tracing::info!(employee_id = %employee.employee_id, company_id = %employee.company_id, "employee registered");
    Ok(employee)
  }

  /// Verify a login and issue a fresh credential.
  pub async fn login(&self, email: &str, password: &str) -> Result<IssuedCredential> {
    let email = normalize_email(email).map_err(|_| Error::Unauthenticated)?;
    let login = self
      .store
      .find_login(&email)
      .await
      .into_core()?
      .ok_or(Error::Unauthenticated)?;
    if !password::verify_password(password, &login.password_hash) {
      tracing::warn!(%email, "login rejected");
      return Err(Error::Unauthenticated);
    }
    match self.store.get_employee(login.employee_id).await.into_core()? {
      Some(e) if e.active => {}
      _ => return Err(Error::Unauthenticated),
    }
    self.credentials.issue(login.employee_id, self.clock.now())
  }

  // ── Companies & employees ─────────────────────────────────────────────────

  pub async fn create_company(&self, credential: &Credential, input: NewCompany) -> Result<Company> {
    let actor = self.resolve_actor(credential).await?;
    input.validate()?;
    let company = self.store.add_company(input).await.into_core()?;
    tracing::info!(company_id = %company.company_id, created_by = %actor.employee_id, "company created");
    Ok(company)
  }

  pub async fn get_company(&self, credential: &Credential, id: Uuid) -> Result<Company> {
    self.resolve_actor(credential).await?;
    self.require_company(id).await
  }

  pub async fn list_companies(&self, credential: &Credential) -> Result<Vec<Company>> {
    self.resolve_actor(credential).await?;
    self.store.list_companies().await.into_core()
  }

  /// Visible to the employee themself, their coworkers, and any contractor of
  /// their company.
  pub async fn get_employee(&self, credential: &Credential, id: Uuid) -> Result<Employee> {
    let actor = self.resolve_actor(credential).await?;
    let employee = self.require_employee(id).await?;
    let target = Target {
      contractor_id:    actor.company_id,
      subcontractor_id: employee.company_id,
      employee_id:      Some(employee.employee_id),
    };
    self.authorize_read(&actor, &target).await?;
    Ok(employee)
  }

  // ── Company graph ─────────────────────────────────────────────────────────

  /// `true` iff a relationship row exists for the ordered pair, whether or
  /// not it is still active.
  pub async fn is_hiring(
    &self,
    credential: &Credential,
    contractor_id: Uuid,
    subcontractor_id: Uuid,
  ) -> Result<bool> {
    self.resolve_actor(credential).await?;
    self.hires(contractor_id, subcontractor_id).await
  }

  pub async fn list_subcontractors(
    &self,
    credential: &Credential,
    contractor_id: Uuid,
  ) -> Result<Vec<Company>> {
    let rels = self.list_hires(credential, contractor_id).await?;
    self.companies(rels.iter().map(|r| r.subcontractor_id)).await
  }

  pub async fn list_contractors(
    &self,
    credential: &Credential,
    subcontractor_id: Uuid,
  ) -> Result<Vec<Company>> {
    let rels = self.list_hired_by(credential, subcontractor_id).await?;
    self.companies(rels.iter().map(|r| r.contractor_id)).await
  }

  /// Relationship rows where `contractor_id` hires.
  pub async fn list_hires(
    &self,
    credential: &Credential,
    contractor_id: Uuid,
  ) -> Result<Vec<Relationship>> {
    self.resolve_actor(credential).await?;
    self.store.list_relationships_by_contractor(contractor_id).await.into_core()
  }

  /// Relationship rows where `subcontractor_id` is hired.
  pub async fn list_hired_by(
    &self,
    credential: &Credential,
    subcontractor_id: Uuid,
  ) -> Result<Vec<Relationship>> {
    self.resolve_actor(credential).await?;
    self.store.list_relationships_by_subcontractor(subcontractor_id).await.into_core()
  }

  pub async fn create_relationship(
    &self,
    credential: &Credential,
    key: RelationshipKey,
    input: NewRelationship,
  ) -> Result<Relationship> {
    let actor = self.resolve_actor(credential).await?;
    self.authorize(&actor, Action::ManageRelationship, &key.into()).await?;

    let rel = input.into_relationship(key);
    rel.validate()?;
    self.require_company(key.contractor_id).await?;
    self.require_company(key.subcontractor_id).await?;
    if self.hires(key.contractor_id, key.subcontractor_id).await? {
      return Err(Error::DuplicateRelationship {
        contractor_id:    key.contractor_id,
        subcontractor_id: key.subcontractor_id,
      });
    }

    let rel = self.store.add_relationship(rel).await.into_core()?;
    tracing::info!(contractor_id = %key.contractor_id, subcontractor_id = %key.subcontractor_id, "relationship created");
    Ok(rel)
  }

  pub async fn update_relationship(
    &self,
    credential: &Credential,
    key: RelationshipKey,
    patch: RelationshipPatch,
  ) -> Result<Relationship> {
    let actor = self.resolve_actor(credential).await?;
    self.authorize(&actor, Action::ManageRelationship, &key.into()).await?;

    let existing = self
      .store
      .get_relationship(key.contractor_id, key.subcontractor_id)
      .await
      .into_core()?
      .ok_or_else(|| relationship_not_found(key))?;
    let updated = patch.apply(existing);
    updated.validate()?;

    if !self.store.update_relationship(updated.clone()).await.into_core()? {
      return Err(relationship_not_found(key));
    }
    tracing::info!(contractor_id = %key.contractor_id, subcontractor_id = %key.subcontractor_id, "relationship updated");
    Ok(updated)
  }

  /// Remove an edge. Rejected with [`Error::RelationshipInUse`] while any
  /// document is still scoped to the pair.
  pub async fn delete_relationship(&self, credential: &Credential, key: RelationshipKey) -> Result<()> {
    let actor = self.resolve_actor(credential).await?;
    self.authorize(&actor, Action::ManageRelationship, &key.into()).await?;

    if !self
      .store
      .delete_relationship(key.contractor_id, key.subcontractor_id)
      .await
      .into_core()?
    {
      return Err(relationship_not_found(key));
    }
    tracing::info!(contractor_id = %key.contractor_id, subcontractor_id = %key.subcontractor_id, "relationship deleted");
    Ok(())
  }

  // ── Documents ─────────────────────────────────────────────────────────────

  pub async fn create_document(
    &self,
    credential: &Credential,
    req: NewDocumentRequest,
  ) -> Result<Document> {
    let actor = self.resolve_actor(credential).await?;
    req.validate()?;

    let target = Target {
      contractor_id:    req.contractor_id,
      subcontractor_id: req.subcontractor_id,
      employee_id:      req.employee_id,
    };
    self.authorize(&actor, Action::WriteContent, &target).await?;

    if let Some(employee_id) = req.employee_id {
      let employee = self.require_employee(employee_id).await?;
      if employee.company_id != req.subcontractor_id {
        return Err(Error::validation(format!(
          "employee {employee_id} does not work for subcontractor {}",
          req.subcontractor_id
        )));
      }
    }

    if !self.hires(req.contractor_id, req.subcontractor_id).await? {
      return Err(Error::UnrelatedCompanies {
        contractor_id:    req.contractor_id,
        subcontractor_id: req.subcontractor_id,
      });
    }

    let doc = Document::from_request(Uuid::new_v4(), req);
    let doc = self.store.insert_document(doc).await.into_core()?;
    tracing::info!(document_id = %doc.document_id, created_by = %actor.employee_id, "document created");
    self.refresh(doc).await
  }

  pub async fn get_document(&self, credential: &Credential, id: Uuid) -> Result<Document> {
    let actor = self.resolve_actor(credential).await?;
    let doc = self.require_document(id).await?;
    self.authorize_read(&actor, &Target::from(&doc)).await?;
    self.refresh(doc).await
  }

  /// Overwrite a document's content. Never changes its validation state.
  pub async fn update_document(
    &self,
    credential: &Credential,
    id: Uuid,
    req: UpdateDocumentRequest,
  ) -> Result<Document> {
    let actor = self.resolve_actor(credential).await?;
    req.validate()?;
    let mut doc = self.require_document(id).await?;
    self.authorize(&actor, Action::WriteContent, &Target::from(&doc)).await?;

    doc.apply_update(req);
    let doc = self
      .store
      .update_document_content(doc)
      .await
      .into_core()?
      .ok_or_else(|| Error::not_found("document", id))?;
    tracing::info!(document_id = %id, updated_by = %actor.employee_id, "document updated");
    self.refresh(doc).await
  }

  pub async fn delete_document(&self, credential: &Credential, id: Uuid) -> Result<()> {
    let actor = self.resolve_actor(credential).await?;
    let doc = self.require_document(id).await?;
    self.authorize(&actor, Action::Delete, &Target::from(&doc)).await?;

    let deleted = self
      .store
      .delete_document(id)
      .await
      .into_core()?
      .ok_or_else(|| Error::not_found("document", id))?;
    if let Some(file) = deleted.file {
      self.discard_file(&file).await;
    }
    tracing::info!(document_id = %id, deleted_by = %actor.employee_id, "document deleted");
    Ok(())
  }

  /// A human validation decision: `OK` or `ER`, contractor side only.
  pub async fn transition(
    &self,
    credential: &Credential,
    id: Uuid,
    next: ValidationState,
  ) -> Result<Document> {
    let actor = self.resolve_actor(credential).await?;
    let doc = self.require_document(id).await?;
    self.authorize(&actor, Action::WriteValidationState, &Target::from(&doc)).await?;

    // Expired by another writer since the read is `Stale`; already `EX` when
    // read is `InvalidTransition`.
    let doc = match self.expire_if_due(doc).await? {
      Refresh::Current(doc) | Refresh::Expired(doc) => doc,
      Refresh::Raced(_) => return Err(self.lost_race(id).await),
    };
    lifecycle::check_human_transition(doc.validation_state, next)?;

    let today = self.clock.today();
    let date = lifecycle::validation_date_for(next, today);
    match self
      .store
      .compare_and_set_state(id, doc.validation_state, next, date)
      .await
      .into_core()?
    {
      Some(updated) => {
        tracing::info!(
          document_id = %id,
          from = doc.validation_state.code(),
          to = next.code(),
          by = %actor.employee_id,
          "validation state changed"
        );
        Ok(updated)
      }
      None => Err(self.lost_race(id).await),
    }
  }

  /// Bind `bytes` as the document's current attachment, replacing and
  /// discarding any previous one.
  pub async fn attach_file(
    &self,
    credential: &Credential,
    id: Uuid,
    bytes: Vec<u8>,
    file_name: &str,
  ) -> Result<Document> {
    let actor = self.resolve_actor(credential).await?;
    let file_name = file_name.trim();
    if file_name.is_empty() {
      return Err(Error::validation("file name is required"));
    }
    let mut doc = self.require_document(id).await?;
    self.authorize(&actor, Action::WriteContent, &Target::from(&doc)).await?;

    let handle = self
      .files
      .store(bytes, file_name.to_owned())
      .await
      .map_err(files_error)?;
    let new_ref = FileRef { handle, file_name: file_name.to_owned() };
    let previous = doc.file.replace(new_ref.clone());

    let Some(updated) = self.store.update_document_content(doc).await.into_core()? else {
      self.discard_file(&new_ref).await;
      return Err(Error::not_found("document", id));
    };
    if let Some(previous) = previous
      && previous.handle != new_ref.handle
    {
      self.discard_file(&previous).await;
    }
    tracing::info!(document_id = %id, file = %new_ref.handle, "file attached");
    self.refresh(updated).await
  }

  /// The current attachment and its bytes.
  pub async fn download_file(&self, credential: &Credential, id: Uuid) -> Result<(FileRef, Vec<u8>)> {
    let actor = self.resolve_actor(credential).await?;
    let doc = self.require_document(id).await?;
    self.authorize_read(&actor, &Target::from(&doc)).await?;

    let file = doc.file.ok_or_else(|| Error::not_found("file for document", id))?;
    let bytes = self
      .files
      .retrieve(&file.handle)
      .await
      .map_err(files_error)?
      .ok_or_else(|| Error::not_found("file", &file.handle))?;
    Ok((file, bytes))
  }

  pub async fn list_by_employee(&self, credential: &Credential, employee_id: Uuid) -> Result<Vec<Document>> {
    let actor = self.resolve_actor(credential).await?;
    let employee = self.require_employee(employee_id).await?;
    let target = Target {
      contractor_id:    actor.company_id,
      subcontractor_id: employee.company_id,
      employee_id:      Some(employee_id),
    };
    self.authorize_read(&actor, &target).await?;

    let docs = self
      .store
      .list_documents(DocumentQuery::Employee(employee_id))
      .await
      .into_core()?;
    self.refresh_all(docs).await
  }

  /// Both company-scope and employee-scope documents of a subcontractor.
  pub async fn list_by_subcontractor(
    &self,
    credential: &Credential,
    subcontractor_id: Uuid,
  ) -> Result<Vec<Document>> {
    let actor = self.resolve_actor(credential).await?;
    let target = Target {
      contractor_id: actor.company_id,
      subcontractor_id,
      employee_id: None,
    };
    self.authorize_read(&actor, &target).await?;

    let docs = self
      .store
      .list_documents(DocumentQuery::Subcontractor(subcontractor_id))
      .await
      .into_core()?;
    self.refresh_all(docs).await
  }

  /// Documents addressed to `contractor_id`, restricted to those the actor
  /// may read.
  pub async fn list_by_contractor(
    &self,
    credential: &Credential,
    contractor_id: Uuid,
  ) -> Result<Vec<Document>> {
    let actor = self.resolve_actor(credential).await?;
    let docs = self
      .store
      .list_documents(DocumentQuery::Contractor(contractor_id))
      .await
      .into_core()?;

    let mut graph: HashMap<Uuid, GraphFacts> = HashMap::new();
    let mut visible = Vec::with_capacity(docs.len());
    for doc in docs {
      let facts = match graph.get(&doc.subcontractor_id) {
        Some(f) => *f,
        None => {
          let f = self.graph_facts(&actor, doc.subcontractor_id).await?;
          graph.insert(doc.subcontractor_id, f);
          f
        }
      };
      if policy::can_read(&actor, &Target::from(&doc), facts).is_allowed() {
        visible.push(doc);
      }
    }
    self.refresh_all(visible).await
  }

  // ── Lifecycle ─────────────────────────────────────────────────────────────

  /// Expire every document whose `expiration_date` is before today.
  ///
  /// Idempotent: a second run on the same day finds nothing to do.
  pub async fn sweep(&self) -> Result<SweepReport> {
    let today = self.clock.today();
    let candidates = self.store.list_due_for_expiry(today).await.into_core()?;

    let mut report = SweepReport { today: Some(today), ..SweepReport::default() };
    for doc in candidates {
      if !lifecycle::is_due(&doc, today) {
        continue;
      }
      match self
        .store
        .compare_and_set_state(doc.document_id, doc.validation_state, ValidationState::Expired, None)
        .await
        .into_core()?
      {
        Some(_) => report.expired.push(doc.document_id),
        None => report.skipped.push(doc.document_id),
      }
    }

    if !report.is_noop() {
      tracing::info!(%today, expired = report.expired.len(), skipped = report.skipped.len(), "expiration sweep");
    } else {
      tracing::debug!(%today, "expiration sweep found nothing due");
    }
    Ok(report)
  }

  // ── Helpers ───────────────────────────────────────────────────────────────

  async fn hires(&self, contractor_id: Uuid, subcontractor_id: Uuid) -> Result<bool> {
    Ok(
      self
        .store
        .get_relationship(contractor_id, subcontractor_id)
        .await
        .into_core()?
        .is_some(),
    )
  }

  async fn graph_facts(&self, actor: &Actor, subcontractor_id: Uuid) -> Result<GraphFacts> {
    if actor.company_id == subcontractor_id {
      return Ok(GraphFacts::hiring(false));
    }
    Ok(GraphFacts::hiring(self.hires(actor.company_id, subcontractor_id).await?))
  }

  async fn authorize(&self, actor: &Actor, action: Action, target: &Target) -> Result<()> {
    let graph = self.graph_facts(actor, target.subcontractor_id).await?;
    let decision = policy::can_access(actor, action, target, graph);
    if let Decision::Deny(reason) = decision {
      tracing::warn!(employee_id = %actor.employee_id, ?action, %reason, "access denied");
    }
    decision.into_result(action)
  }

  async fn authorize_read(&self, actor: &Actor, target: &Target) -> Result<()> {
    let graph = self.graph_facts(actor, target.subcontractor_id).await?;
    let decision = policy::can_read(actor, target, graph);
    if let Decision::Deny(reason) = decision {
      tracing::warn!(employee_id = %actor.employee_id, %reason, "read denied");
    }
    decision.into_result(Action::ReadAsContractor)
  }

  /// Expire `doc` on read if it is past due.
  async fn refresh(&self, doc: Document) -> Result<Document> {
    match self.expire_if_due(doc).await? {
      Refresh::Current(doc) | Refresh::Expired(doc) => Ok(doc),
      Refresh::Raced(doc) => {
        let id = doc.document_id;
        Ok(self.store.get_document(id).await.into_core()?.unwrap_or(doc))
      }
    }
  }

  async fn expire_if_due(&self, doc: Document) -> Result<Refresh> {
    if !lifecycle::is_due(&doc, self.clock.today()) {
      return Ok(Refresh::Current(doc));
    }
    let id = doc.document_id;
    match self
      .store
      .compare_and_set_state(id, doc.validation_state, ValidationState::Expired, None)
      .await
      .into_core()?
    {
      Some(expired) => {
        tracing::info!(document_id = %id, "document expired on read");
        Ok(Refresh::Expired(expired))
      }
      None => Ok(Refresh::Raced(doc)),
    }
  }

  /// The error for a compare-and-set that found the stored state changed:
  /// `Stale`, or `NotFound` if the document is gone.
  async fn lost_race(&self, id: Uuid) -> Error {
    match self.require_document(id).await {
      Ok(_) => {
        tracing::warn!(document_id = %id, "transition lost a race with a concurrent change");
        Error::Stale(id)
      }
      Err(e) => e,
    }
  }

  async fn refresh_all(&self, docs: Vec<Document>) -> Result<Vec<Document>> {
    let mut out = Vec::with_capacity(docs.len());
    for doc in docs {
      out.push(self.refresh(doc).await?);
    }
    Ok(out)
  }

  async fn companies(&self, ids: impl Iterator<Item = Uuid>) -> Result<Vec<Company>> {
    let mut out = Vec::new();
    for id in ids {
      if let Some(company) = self.store.get_company(id).await.into_core()? {
        out.push(company);
      }
    }
    Ok(out)
  }

  async fn require_company(&self, id: Uuid) -> Result<Company> {
    self
      .store
      .get_company(id)
      .await
      .into_core()?
      .ok_or_else(|| Error::not_found("company", id))
  }

  async fn require_employee(&self, id: Uuid) -> Result<Employee> {
    self
      .store
      .get_employee(id)
      .await
      .into_core()?
      .ok_or_else(|| Error::not_found("employee", id))
  }

  async fn require_document(&self, id: Uuid) -> Result<Document> {
    self
      .store
      .get_document(id)
      .await
      .into_core()?
      .ok_or_else(|| Error::not_found("document", id))
  }

  /// Unreferenced files are garbage; failing to remove one is not fatal.
  async fn discard_file(&self, file: &FileRef) {
    if let Err(e) = self.files.delete(&file.handle).await {
      tracing::warn!(file = %file.handle, error = %e, "failed to delete unreferenced file");
    }
  }
}

/// What [`Engine::expire_if_due`] found.
enum Refresh {
  /// Not due; returned as read.
  Current(Document),
  /// Expired by this call.
  Expired(Document),
  /// The stored state no longer matched the read; carries the stale read.
  Raced(Document),
}

fn relationship_not_found(key: RelationshipKey) -> Error {
  Error::not_found("relationship", format!("{} -> {}", key.contractor_id, key.subcontractor_id))
}

fn normalize_email(email: &str) -> Result<String> {
  let email = email.trim().to_lowercase();
  match email.split_once('@') {
    Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
    _ => Err(Error::validation("a valid email is required")),
  }
}
