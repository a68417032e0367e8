//! Handlers for the contractor → subcontractor edges.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/companies/{id}/hires` | Relationship rows where `:id` is the contractor |
//! | `GET`    | `/companies/{id}/hired-by` | Rows where `:id` is the subcontractor |
//! | `GET`    | `/companies/{c}/hires/{s}` | `{"hiring": bool}` |
//! | `POST`   | `/companies/{c}/hires/{s}` | Body: [`NewRelationship`]; 201, 409 on duplicate |
//! | `PATCH`  | `/companies/{c}/hires/{s}` | Body: [`RelationshipPatch`]; absent fields are kept |
//! | `DELETE` | `/companies/{c}/hires/{s}` | 204; 409 while documents remain |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use docket_core::{
  relationship::{NewRelationship, Relationship, RelationshipKey, RelationshipPatch},
  storage::FileStorage,
  store::ComplianceStore,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{AppState, auth::Bearer, error::ApiError};

fn key((contractor_id, subcontractor_id): (Uuid, Uuid)) -> RelationshipKey {
  RelationshipKey::new(contractor_id, subcontractor_id)
}

/// `GET /companies/{id}/hires`
pub async fn hires<S, F>(
  State(engine): State<AppState<S, F>>,
  Bearer(cred): Bearer,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Relationship>>, ApiError>
where
  S: ComplianceStore,
  F: FileStorage,
{
  Ok(Json(engine.list_hires(&cred, id).await?))
}

/// `GET /companies/{id}/hired-by`
pub async fn hired_by<S, F>(
  State(engine): State<AppState<S, F>>,
  Bearer(cred): Bearer,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Relationship>>, ApiError>
where
  S: ComplianceStore,
  F: FileStorage,
{
  Ok(Json(engine.list_hired_by(&cred, id).await?))
}

#[derive(Debug, Serialize)]
pub struct Hiring {
  pub hiring: bool,
}

/// `GET /companies/{c}/hires/{s}`
pub async fn is_hiring<S, F>(
  State(engine): State<AppState<S, F>>,
  Bearer(cred): Bearer,
  Path((c, s)): Path<(Uuid, Uuid)>,
) -> Result<Json<Hiring>, ApiError>
where
  S: ComplianceStore,
  F: FileStorage,
{
  let hiring = engine.is_hiring(&cred, c, s).await?;
  Ok(Json(Hiring { hiring }))
}

/// `POST /companies/{c}/hires/{s}`
pub async fn create<S, F>(
  State(engine): State<AppState<S, F>>,
  Bearer(cred): Bearer,
  Path(pair): Path<(Uuid, Uuid)>,
  Json(body): Json<NewRelationship>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ComplianceStore,
  F: FileStorage,
{
  let rel = engine.create_relationship(&cred, key(pair), body).await?;
  Ok((StatusCode::CREATED, Json(rel)))
}

/// `PATCH /companies/{c}/hires/{s}`
pub async fn update<S, F>(
  State(engine): State<AppState<S, F>>,
  Bearer(cred): Bearer,
  Path(pair): Path<(Uuid, Uuid)>,
  Json(body): Json<RelationshipPatch>,
) -> Result<Json<Relationship>, ApiError>
where
  S: ComplianceStore,
  F: FileStorage,
{
  Ok(Json(engine.update_relationship(&cred, key(pair), body).await?))
}

/// `DELETE /companies/{c}/hires/{s}`
pub async fn remove<S, F>(
  State(engine): State<AppState<S, F>>,
  Bearer(cred): Bearer,
  Path(pair): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError>
where
  S: ComplianceStore,
  F: FileStorage,
{
  engine.delete_relationship(&cred, key(pair)).await?;
  Ok(StatusCode::NO_CONTENT)
}
