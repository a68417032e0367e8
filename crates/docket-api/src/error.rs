//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use docket_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] CoreError),

  #[error("bad request: {0}")]
  BadRequest(String),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Core(e) => match e {
        CoreError::Unauthenticated => StatusCode::UNAUTHORIZED,
        CoreError::Forbidden { .. } => StatusCode::FORBIDDEN,
        CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        CoreError::DuplicateRelationship { .. }
        | CoreError::RelationshipInUse { .. }
        | CoreError::Stale(_) => StatusCode::CONFLICT,
        CoreError::SelfRelationship(_)
        | CoreError::UnrelatedCompanies { .. }
        | CoreError::InvalidTransition { .. }
        | CoreError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CoreError::Store(_) | CoreError::Files(_) | CoreError::Credentials(_) => {
          StatusCode::INTERNAL_SERVER_ERROR
        }
      },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
      tracing::error!(error = %self, "request failed");
      "internal error".to_owned()
    } else {
      self.to_string()
    };
    let mut res = (status, Json(json!({ "error": message }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer realm=\"docket\""));
    }
    res
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  #[test]
  fn taxonomy_maps_onto_statuses() {
    let id = Uuid::new_v4();
    let cases = [
      (CoreError::Unauthenticated, StatusCode::UNAUTHORIZED),
      (CoreError::not_found("document", id), StatusCode::NOT_FOUND),
      (CoreError::Stale(id), StatusCode::CONFLICT),
      (CoreError::SelfRelationship(id), StatusCode::UNPROCESSABLE_ENTITY),
      (CoreError::validation("name is required"), StatusCode::UNPROCESSABLE_ENTITY),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError::from(err).status(), status);
    }
    assert_eq!(ApiError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
  }
}
