//! JSON REST API for Docket.
//!
//! Exposes an axum [`Router`] backed by a [`docket_core::engine::Engine`].
//! Every privileged route reads the caller's bearer token from the
//! `Authorization` header and passes it explicitly to the engine. TLS and
//! request tracing are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", docket_api::api_router(engine.clone()))
//! ```

pub mod auth;
pub mod companies;
pub mod documents;
pub mod error;
pub mod relationships;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use docket_core::{engine::Engine, storage::FileStorage, store::ComplianceStore};

pub use auth::Bearer;
pub use error::ApiError;

/// Shared handler state.
pub type AppState<S, F> = Arc<Engine<S, F>>;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, F>(engine: AppState<S, F>) -> Router<()>
where
  S: ComplianceStore + 'static,
  F: FileStorage + 'static,
{
  Router::new()
    // Accounts
    .route("/auth/register", post(auth::register::<S, F>))
    .route("/auth/login", post(auth::login::<S, F>))
    // Companies & employees
    .route("/companies", get(companies::list::<S, F>).post(companies::create::<S, F>))
    .route("/companies/{id}", get(companies::get_one::<S, F>))
    .route("/companies/{id}/subcontractors", get(companies::subcontractors::<S, F>))
    .route("/companies/{id}/contractors", get(companies::contractors::<S, F>))
    .route("/employees/{id}", get(companies::employee::<S, F>))
    // Relationships
    .route("/companies/{id}/hires", get(relationships::hires::<S, F>))
    .route("/companies/{id}/hired-by", get(relationships::hired_by::<S, F>))
    .route(
      "/companies/{contractor_id}/hires/{subcontractor_id}",
      get(relationships::is_hiring::<S, F>)
        .post(relationships::create::<S, F>)
        .patch(relationships::update::<S, F>)
        .delete(relationships::remove::<S, F>),
    )
    // Documents
    .route("/documents", post(documents::create::<S, F>))
    .route(
      "/documents/{id}",
      get(documents::get_one::<S, F>)
        .put(documents::update::<S, F>)
        .delete(documents::remove::<S, F>),
    )
    .route("/documents/{id}/state", put(documents::transition::<S, F>))
    .route(
      "/documents/{id}/file",
      get(documents::download::<S, F>).put(documents::attach::<S, F>),
    )
    .route("/companies/{id}/documents", get(documents::by_subcontractor::<S, F>))
    .route("/companies/{id}/received-documents", get(documents::by_contractor::<S, F>))
    .route("/employees/{id}/documents", get(documents::by_employee::<S, F>))
    .with_state(engine)
}
