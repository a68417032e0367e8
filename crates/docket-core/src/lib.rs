//! Core types and rules for the Docket compliance-document tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the domain model, the access policy, the validation lifecycle and the
//! [`engine::Engine`] that threads them together over a pluggable
//! [`store::ComplianceStore`] backend.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod clock;
pub mod company;
pub mod document;
pub mod engine;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod password;
pub mod policy;
pub mod relationship;
pub mod storage;
pub mod store;

pub use error::{Error, Result};
