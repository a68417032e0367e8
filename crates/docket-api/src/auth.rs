//! Bearer-token extraction and the account endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/register` | Body: employee fields + `email` + `password`; 201 |
//! | `POST` | `/auth/login` | Body: `{"email":"...","password":"..."}`; returns a token |

use std::convert::Infallible;

use axum::{
  Json,
  extract::{FromRequestParts, State},
  http::{StatusCode, header, request::Parts},
  response::IntoResponse,
};
use docket_core::{
  company::Registration,
  identity::{Credential, IssuedCredential},
  storage::FileStorage,
  store::ComplianceStore,
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

// ─── Extractor ────────────────────────────────────────────────────────────────

/// The caller's credential, taken from `Authorization: Bearer <token>`.
///
/// Never rejects: a missing or non-bearer header yields an empty credential,
/// which the engine refuses as unauthenticated.
pub struct Bearer(pub Credential);

impl<S: Send + Sync> FromRequestParts<S> for Bearer {
  type Rejection = Infallible;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    let header = parts
      .headers
      .get(header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok());
    Ok(Bearer(Credential::from_authorization(header)))
  }
}

// ─── Register ─────────────────────────────────────────────────────────────────

/// `POST /auth/register`
pub async fn register<S, F>(
  State(engine): State<AppState<S, F>>,
  Json(body): Json<Registration>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ComplianceStore,
  F: FileStorage,
{
  let employee = engine.register(body).await?;
  Ok((StatusCode::CREATED, Json(employee)))
}

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

/// `POST /auth/login`
pub async fn login<S, F>(
  State(engine): State<AppState<S, F>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<IssuedCredential>, ApiError>
where
  S: ComplianceStore,
  F: FileStorage,
{
  Ok(Json(engine.login(&body.email, &body.password).await?))
}
