//! Handlers for `/documents` endpoints and the per-company listings.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/documents` | Body: [`NewDocumentRequest`]; 201, always starts in `VA` |
//! | `GET`    | `/documents/{id}` | Owner company or a hiring contractor |
//! | `PUT`    | `/documents/{id}` | Body: [`UpdateDocumentRequest`]; full content overwrite |
//! | `DELETE` | `/documents/{id}` | 204; also discards the attachment |
//! | `PUT`    | `/documents/{id}/state` | Body: `{"state":"OK"\|"ER"}`; contractor only |
//! | `PUT`    | `/documents/{id}/file?name=<file name>` | Raw body becomes the attachment |
//! | `GET`    | `/documents/{id}/file` | Attachment bytes |
//! | `GET`    | `/companies/{id}/documents` | Documents owned by a subcontractor |
//! | `GET`    | `/companies/{id}/received-documents` | Documents addressed to a contractor |
//! | `GET`    | `/employees/{id}/documents` | Employee-scope documents |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use bytes::Bytes;
use docket_core::{
  document::{Document, NewDocumentRequest, UpdateDocumentRequest, ValidationState},
  storage::FileStorage,
  store::ComplianceStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::Bearer, error::ApiError};

// ─── CRUD ─────────────────────────────────────────────────────────────────────

/// `POST /documents`
pub async fn create<S, F>(
  State(engine): State<AppState<S, F>>,
  Bearer(cred): Bearer,
  Json(body): Json<NewDocumentRequest>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ComplianceStore,
  F: FileStorage,
{
  let doc = engine.create_document(&cred, body).await?;
  Ok((StatusCode::CREATED, Json(doc)))
}

/// `GET /documents/{id}`
pub async fn get_one<S, F>(
  State(engine): State<AppState<S, F>>,
  Bearer(cred): Bearer,
  Path(id): Path<Uuid>,
) -> Result<Json<Document>, ApiError>
where
  S: ComplianceStore,
  F: FileStorage,
{
  Ok(Json(engine.get_document(&cred, id).await?))
}

/// `PUT /documents/{id}`
pub async fn update<S, F>(
  State(engine): State<AppState<S, F>>,
  Bearer(cred): Bearer,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateDocumentRequest>,
) -> Result<Json<Document>, ApiError>
where
  S: ComplianceStore,
  F: FileStorage,
{
  Ok(Json(engine.update_document(&cred, id, body).await?))
}

/// `DELETE /documents/{id}`
pub async fn remove<S, F>(
  State(engine): State<AppState<S, F>>,
  Bearer(cred): Bearer,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: ComplianceStore,
  F: FileStorage,
{
  engine.delete_document(&cred, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Lifecycle ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TransitionBody {
  pub state: ValidationState,
}

/// `PUT /documents/{id}/state`
pub async fn transition<S, F>(
  State(engine): State<AppState<S, F>>,
  Bearer(cred): Bearer,
  Path(id): Path<Uuid>,
  Json(body): Json<TransitionBody>,
) -> Result<Json<Document>, ApiError>
where
  S: ComplianceStore,
  F: FileStorage,
{
  Ok(Json(engine.transition(&cred, id, body.state).await?))
}

// ─── Attachments ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AttachParams {
  pub name: String,
}

/// `PUT /documents/{id}/file?name=<file name>`
pub async fn attach<S, F>(
  State(engine): State<AppState<S, F>>,
  Bearer(cred): Bearer,
  Path(id): Path<Uuid>,
  Query(params): Query<AttachParams>,
  body: Bytes,
) -> Result<Json<Document>, ApiError>
where
  S: ComplianceStore,
  F: FileStorage,
{
  if body.is_empty() {
    return Err(ApiError::BadRequest("empty file body".into()));
  }
  Ok(Json(engine.attach_file(&cred, id, body.to_vec(), &params.name).await?))
}

/// `GET /documents/{id}/file`
pub async fn download<S, F>(
  State(engine): State<AppState<S, F>>,
  Bearer(cred): Bearer,
  Path(id): Path<Uuid>,
) -> Result<Response, ApiError>
where
  S: ComplianceStore,
  F: FileStorage,
{
  let (file, bytes) = engine.download_file(&cred, id).await?;
  let disposition = HeaderValue::from_str(&format!(
    "attachment; filename=\"{}\"",
    header_safe(&file.file_name)
  ))
  .unwrap_or(HeaderValue::from_static("attachment"));

  Ok(
    (
      [
        (header::CONTENT_TYPE, HeaderValue::from_static("application/octet-stream")),
        (header::CONTENT_DISPOSITION, disposition),
      ],
      bytes,
    )
      .into_response(),
  )
}

/// Replace anything that cannot sit inside a quoted header parameter.
fn header_safe(name: &str) -> String {
  name
    .chars()
    .map(|c| if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') { c } else { '_' })
    .collect()
}

// ─── Listings ─────────────────────────────────────────────────────────────────

/// `GET /companies/{id}/documents`
pub async fn by_subcontractor<S, F>(
  State(engine): State<AppState<S, F>>,
  Bearer(cred): Bearer,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Document>>, ApiError>
where
  S: ComplianceStore,
  F: FileStorage,
{
  Ok(Json(engine.list_by_subcontractor(&cred, id).await?))
}

/// `GET /companies/{id}/received-documents`
pub async fn by_contractor<S, F>(
  State(engine): State<AppState<S, F>>,
  Bearer(cred): Bearer,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Document>>, ApiError>
where
  S: ComplianceStore,
  F: FileStorage,
{
  Ok(Json(engine.list_by_contractor(&cred, id).await?))
}

/// `GET /employees/{id}/documents`
pub async fn by_employee<S, F>(
  State(engine): State<AppState<S, F>>,
  Bearer(cred): Bearer,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Document>>, ApiError>
where
  S: ComplianceStore,
  F: FileStorage,
{
  Ok(Json(engine.list_by_employee(&cred, id).await?))
}

#[cfg(test)]
mod tests {
  use super::header_safe;

  #[test]
  fn file_names_are_made_header_safe() {
    assert_eq!(header_safe("policy 2024.pdf"), "policy 2024.pdf");
    assert_eq!(header_safe("a\"b\\c.pdf"), "a_b_c.pdf");
    assert_eq!(header_safe("seguro-año.pdf"), "seguro-a_o.pdf");
  }
}
