//! Handlers for `/companies` and `/employees` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/companies` | Ordered by id |
//! | `POST` | `/companies` | Body: [`NewCompany`]; 201 |
//! | `GET`  | `/companies/{id}` | 404 if not found |
//! | `GET`  | `/companies/{id}/subcontractors` | Companies it hires |
//! | `GET`  | `/companies/{id}/contractors` | Companies hiring it |
//! | `GET`  | `/employees/{id}` | Self, coworkers, or a hiring contractor |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use docket_core::{
  company::{Company, Employee, NewCompany},
  storage::FileStorage,
  store::ComplianceStore,
};
use uuid::Uuid;

use crate::{AppState, auth::Bearer, error::ApiError};

/// `GET /companies`
pub async fn list<S, F>(
  State(engine): State<AppState<S, F>>,
  Bearer(cred): Bearer,
) -> Result<Json<Vec<Company>>, ApiError>
where
  S: ComplianceStore,
  F: FileStorage,
{
  Ok(Json(engine.list_companies(&cred).await?))
}

/// `POST /companies`
pub async fn create<S, F>(
  State(engine): State<AppState<S, F>>,
  Bearer(cred): Bearer,
  Json(body): Json<NewCompany>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ComplianceStore,
  F: FileStorage,
{
  let company = engine.create_company(&cred, body).await?;
  Ok((StatusCode::CREATED, Json(company)))
}

/// `GET /companies/{id}`
pub async fn get_one<S, F>(
  State(engine): State<AppState<S, F>>,
  Bearer(cred): Bearer,
  Path(id): Path<Uuid>,
) -> Result<Json<Company>, ApiError>
where
  S: ComplianceStore,
  F: FileStorage,
{
  Ok(Json(engine.get_company(&cred, id).await?))
}

/// `GET /companies/{id}/subcontractors`
pub async fn subcontractors<S, F>(
  State(engine): State<AppState<S, F>>,
  Bearer(cred): Bearer,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Company>>, ApiError>
where
  S: ComplianceStore,
  F: FileStorage,
{
  Ok(Json(engine.list_subcontractors(&cred, id).await?))
}

/// `GET /companies/{id}/contractors`
pub async fn contractors<S, F>(
  State(engine): State<AppState<S, F>>,
  Bearer(cred): Bearer,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Company>>, ApiError>
where
  S: ComplianceStore,
  F: FileStorage,
{
  Ok(Json(engine.list_contractors(&cred, id).await?))
}

/// `GET /employees/{id}`
pub async fn employee<S, F>(
  State(engine): State<AppState<S, F>>,
  Bearer(cred): Bearer,
  Path(id): Path<Uuid>,
) -> Result<Json<Employee>, ApiError>
where
  S: ComplianceStore,
  F: FileStorage,
{
  Ok(Json(engine.get_employee(&cred, id).await?))
}
