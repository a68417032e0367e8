use docket_core::{
  Error as CoreError,
  document::{Document, FileRef, NewDocumentRequest, ValidationState},
  relationship::Relationship,
  storage::FileHandle,
  store::{ComplianceStore, DocumentQuery},
};
use uuid::Uuid;

use super::{date, new_company, new_employee, store};
use crate::{Error, SqliteStore};

async fn pair(s: &SqliteStore) -> (Uuid, Uuid) {
  let c = s.add_company(new_company("Contractor")).await.unwrap();
  let sub = s.add_company(new_company("Sub")).await.unwrap();
  s.add_relationship(relationship(c.company_id, sub.company_id))
    .await
    .unwrap();
  (c.company_id, sub.company_id)
}

fn relationship(contractor_id: Uuid, subcontractor_id: Uuid) -> Relationship {
  Relationship {
    contractor_id,
    subcontractor_id,
    start_date: date(2024, 1, 1),
    end_date: None,
    additional_info: None,
  }
}

fn document(contractor_id: Uuid, subcontractor_id: Uuid, name: &str, day: u32) -> Document {
  Document::from_request(Uuid::new_v4(), NewDocumentRequest {
    contractor_id,
    subcontractor_id,
    name: name.into(),
    date: date(2024, 2, day),
    expiration_date: Some(date(2024, 6, 1)),
    employee_id: None,
    additional_info: None,
  })
}

// ─── Companies & employees ───────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_company() {
  let s = store().await;
  let company = s.add_company(new_company("Acme")).await.unwrap();

  let fetched = s.get_company(company.company_id).await.unwrap().unwrap();
  assert_eq!(fetched, company);
  assert!(s.get_company(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_companies_is_ordered_by_id() {
  let s = store().await;
  for name in ["A", "B", "C", "D"] {
    s.add_company(new_company(name)).await.unwrap();
  }
  let ids: Vec<Uuid> = s
    .list_companies()
    .await
    .unwrap()
    .into_iter()
    .map(|c| c.company_id)
    .collect();
  let mut sorted = ids.clone();
  sorted.sort();
  assert_eq!(ids, sorted);
  assert_eq!(ids.len(), 4);
}

#[tokio::test]
async fn employee_and_login_are_stored_together() {
  let s = store().await;
  let company = s.add_company(new_company("Acme")).await.unwrap();
  let employee = s
    .add_employee(
      new_employee(company.company_id, "Ana"),
      "ana@acme.test".into(),
      "$argon2id$fake".into(),
    )
    .await
    .unwrap();

  assert_eq!(s.get_employee(employee.employee_id).await.unwrap().unwrap(), employee);
  let login = s.find_login("ana@acme.test").await.unwrap().unwrap();
  assert_eq!(login.employee_id, employee.employee_id);
  assert_eq!(login.password_hash, "$argon2id$fake");
  assert!(s.find_login("nobody@acme.test").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
  let s = store().await;
  let company = s.add_company(new_company("Acme")).await.unwrap();
  s.add_employee(new_employee(company.company_id, "Ana"), "ana@acme.test".into(), "h".into())
    .await
    .unwrap();

  let err = s
    .add_employee(new_employee(company.company_id, "Bea"), "ana@acme.test".into(), "h".into())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::Validation(_))));
}

// ─── Relationships ───────────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_relationship_is_rejected() {
  let s = store().await;
  let (c, sub) = pair(&s).await;

  let err = s.add_relationship(relationship(c, sub)).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::DuplicateRelationship { contractor_id, subcontractor_id })
      if contractor_id == c && subcontractor_id == sub
  ));

  // The reverse direction is a different edge.
  s.add_relationship(relationship(sub, c)).await.unwrap();
}

#[tokio::test]
async fn update_relationship_overwrites_attributes() {
  let s = store().await;
  let (c, sub) = pair(&s).await;

  let mut rel = s.get_relationship(c, sub).await.unwrap().unwrap();
  rel.end_date = Some(date(2024, 12, 31));
  rel.additional_info = Some("renewed".into());
  assert!(s.update_relationship(rel.clone()).await.unwrap());
  assert_eq!(s.get_relationship(c, sub).await.unwrap().unwrap(), rel);

  assert!(!s.update_relationship(relationship(sub, c)).await.unwrap());
}

#[tokio::test]
async fn relationship_listings_are_ordered_by_start_date_then_id() {
  let s = store().await;
  let c = s.add_company(new_company("Contractor")).await.unwrap().company_id;

  let mut subs = Vec::new();
  for (name, start) in [("late", date(2024, 5, 1)), ("x", date(2024, 1, 1)), ("y", date(2024, 1, 1))] {
    let sub = s.add_company(new_company(name)).await.unwrap().company_id;
    let mut rel = relationship(c, sub);
    rel.start_date = start;
    s.add_relationship(rel).await.unwrap();
    subs.push(sub);
  }

  let listed: Vec<Uuid> = s
    .list_relationships_by_contractor(c)
    .await
    .unwrap()
    .into_iter()
    .map(|r| r.subcontractor_id)
    .collect();
  let mut early = vec![subs[1], subs[2]];
  early.sort();
  assert_eq!(listed, vec![early[0], early[1], subs[0]]);

  let hired_by = s.list_relationships_by_subcontractor(subs[0]).await.unwrap();
  assert_eq!(hired_by.len(), 1);
  assert_eq!(hired_by[0].contractor_id, c);
  assert!(s.list_relationships_by_subcontractor(c).await.unwrap().is_empty());
}

#[tokio::test]
async fn relationship_with_documents_cannot_be_deleted() {
  let s = store().await;
  let (c, sub) = pair(&s).await;
  let doc = s.insert_document(document(c, sub, "Insurance", 1)).await.unwrap();

  let err = s.delete_relationship(c, sub).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::RelationshipInUse { documents: 1, .. })
  ));
  assert!(s.get_relationship(c, sub).await.unwrap().is_some());

  s.delete_document(doc.document_id).await.unwrap();
  assert!(s.delete_relationship(c, sub).await.unwrap());
  assert!(!s.delete_relationship(c, sub).await.unwrap());
}

// ─── Documents ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn document_requires_an_existing_relationship_row() {
  let s = store().await;
  let c = s.add_company(new_company("C")).await.unwrap().company_id;
  let sub = s.add_company(new_company("S")).await.unwrap().company_id;

  let result = s.insert_document(document(c, sub, "Orphan", 1)).await;
  assert!(matches!(result, Err(Error::Database(_))));
}

#[tokio::test]
async fn content_update_never_touches_state() {
  let s = store().await;
  let (c, sub) = pair(&s).await;
  let doc = s.insert_document(document(c, sub, "Insurance", 1)).await.unwrap();
  s.compare_and_set_state(
    doc.document_id,
    ValidationState::Pending,
    ValidationState::Validated,
    Some(date(2024, 3, 1)),
  )
  .await
  .unwrap()
  .unwrap();

  // A stale in-memory copy still says VA; writing it back keeps OK.
  let mut stale = doc.clone();
  stale.name = "Insurance 2024".into();
  stale.file = Some(FileRef { handle: FileHandle("h1".into()), file_name: "policy.pdf".into() });
  let updated = s.update_document_content(stale).await.unwrap().unwrap();

  assert_eq!(updated.name, "Insurance 2024");
  assert_eq!(updated.validation_state, ValidationState::Validated);
  assert_eq!(updated.validation_date, Some(date(2024, 3, 1)));
  assert_eq!(updated.file.unwrap().file_name, "policy.pdf");

  let mut missing = doc;
  missing.document_id = Uuid::new_v4();
  assert!(s.update_document_content(missing).await.unwrap().is_none());
}

#[tokio::test]
async fn compare_and_set_detects_a_changed_state() {
  let s = store().await;
  let (c, sub) = pair(&s).await;
  let doc = s.insert_document(document(c, sub, "Insurance", 1)).await.unwrap();

  let expired = s
    .compare_and_set_state(doc.document_id, ValidationState::Pending, ValidationState::Expired, None)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(expired.validation_state, ValidationState::Expired);

  let lost = s
    .compare_and_set_state(
      doc.document_id,
      ValidationState::Pending,
      ValidationState::Validated,
      Some(date(2024, 3, 1)),
    )
    .await
    .unwrap();
  assert!(lost.is_none());
  assert_eq!(
    s.get_document(doc.document_id).await.unwrap().unwrap().validation_state,
    ValidationState::Expired
  );
}

#[tokio::test]
async fn validation_date_invariant_is_enforced_by_the_schema() {
  let s = store().await;
  let (c, sub) = pair(&s).await;
  let doc = s.insert_document(document(c, sub, "Insurance", 1)).await.unwrap();

  let result = s
    .compare_and_set_state(doc.document_id, ValidationState::Pending, ValidationState::Validated, None)
    .await;
  assert!(matches!(result, Err(Error::Database(_))));
}

#[tokio::test]
async fn listings_are_ordered_by_date_and_scoped() {
  let s = store().await;
  let (c, sub) = pair(&s).await;
  let employee = s
    .add_employee(new_employee(sub, "Eva"), "eva@sub.test".into(), "h".into())
    .await
    .unwrap();

  let late = s.insert_document(document(c, sub, "Late", 20)).await.unwrap();
  let early = s.insert_document(document(c, sub, "Early", 2)).await.unwrap();
  let mut personal = document(c, sub, "Training", 10);
  personal.employee_id = Some(employee.employee_id);
  let personal = s.insert_document(personal).await.unwrap();

  let by_sub: Vec<String> = s
    .list_documents(DocumentQuery::Subcontractor(sub))
    .await
    .unwrap()
    .into_iter()
    .map(|d| d.name)
    .collect();
  assert_eq!(by_sub, ["Early", "Training", "Late"]);

  let by_employee = s
    .list_documents(DocumentQuery::Employee(employee.employee_id))
    .await
    .unwrap();
  assert_eq!(by_employee, vec![personal]);

  let by_contractor = s.list_documents(DocumentQuery::Contractor(c)).await.unwrap();
  assert_eq!(by_contractor.first(), Some(&early));
  assert_eq!(by_contractor.last(), Some(&late));

  assert!(s.list_documents(DocumentQuery::Contractor(sub)).await.unwrap().is_empty());
}

#[tokio::test]
async fn due_for_expiry_skips_expired_and_open_ended_documents() {
  let s = store().await;
  let (c, sub) = pair(&s).await;

  let due = s.insert_document(document(c, sub, "Due", 1)).await.unwrap();
  let mut open = document(c, sub, "Open", 1);
  open.expiration_date = None;
  s.insert_document(open).await.unwrap();
  let already = s.insert_document(document(c, sub, "Already", 1)).await.unwrap();
  s.compare_and_set_state(already.document_id, ValidationState::Pending, ValidationState::Expired, None)
    .await
    .unwrap();

  // Expiring on 2024-06-01 is not yet due on that same day.
  assert!(s.list_due_for_expiry(date(2024, 6, 1)).await.unwrap().is_empty());

  let listed = s.list_due_for_expiry(date(2024, 6, 2)).await.unwrap();
  assert_eq!(listed, vec![due]);
}

#[tokio::test]
async fn delete_document_returns_the_removed_row() {
  let s = store().await;
  let (c, sub) = pair(&s).await;
  let doc = s.insert_document(document(c, sub, "Insurance", 1)).await.unwrap();

  assert_eq!(s.delete_document(doc.document_id).await.unwrap(), Some(doc.clone()));
  assert!(s.get_document(doc.document_id).await.unwrap().is_none());
  assert!(s.delete_document(doc.document_id).await.unwrap().is_none());
}

#[tokio::test]
async fn data_survives_reopening_the_file() {
  let dir = std::env::temp_dir().join(format!("docket-test-{}", Uuid::new_v4()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("docket.db");

  let company = {
    let s = SqliteStore::open(&path).await.unwrap();
    s.add_company(new_company("Durable")).await.unwrap()
  };

  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.get_company(company.company_id).await.unwrap(), Some(company));
  drop(s);
  let _ = std::fs::remove_dir_all(&dir);
}
