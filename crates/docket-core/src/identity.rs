//! Identity: turning an opaque credential into an acting employee.
//!
//! There is no ambient session. Every engine call receives the caller's
//! [`Credential`] and re-resolves it, because tokens can expire between two
//! requests of the same session.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// An opaque bearer token as presented by the caller. May be empty when the
/// request carried none.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
  pub fn new(token: impl Into<String>) -> Self { Self(token.into()) }

  /// A credential for a request that presented nothing.
  pub fn anonymous() -> Self { Self::default() }

  /// Parse the value of an `Authorization` header. Anything other than a
  /// `Bearer` scheme yields an anonymous credential.
  pub fn from_authorization(header: Option<&str>) -> Self {
    header
      .and_then(|h| h.strip_prefix("Bearer "))
      .map(|t| Self::new(t.trim()))
      .unwrap_or_default()
  }

  pub fn token(&self) -> &str { &self.0 }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl fmt::Debug for Credential {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_empty() {
      f.write_str("Credential(<none>)")
    } else {
      f.write_str("Credential(<redacted>)")
    }
  }
}

/// What the credential provider extracts from a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedCredential {
  pub employee_id: Uuid,
  pub expires_at:  DateTime<Utc>,
}

/// A freshly issued token, returned by the login flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedCredential {
  pub token:       String,
  pub employee_id: Uuid,
  pub expires_at:  DateTime<Utc>,
}

/// The credential provider collaborator. Decoding is pure: it validates the
/// token's integrity and reads its claims, but does not judge expiry; that is
/// left to [`resolve_employee`] so the engine's clock stays authoritative.
pub trait CredentialProvider: Send + Sync {
  /// Returns `None` for malformed or tampered tokens.
  fn decode(&self, token: &str) -> Option<DecodedCredential>;

  fn issue(&self, employee_id: Uuid, now: DateTime<Utc>) -> Result<IssuedCredential>;
}

/// The resolved caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
  pub employee_id: Uuid,
  pub company_id:  Uuid,
}

/// Validate a credential and return the employee id it names.
///
/// Fails with [`Error::Unauthenticated`] if the credential is absent,
/// malformed, or its expiry is not strictly after `now`.
pub fn resolve_employee(
  credential: &Credential,
  provider: &dyn CredentialProvider,
  now: DateTime<Utc>,
) -> Result<Uuid> {
  if credential.is_empty() {
    return Err(Error::Unauthenticated);
  }
  let decoded = provider
    .decode(credential.token())
    .ok_or(Error::Unauthenticated)?;
  if decoded.expires_at <= now {
    return Err(Error::Unauthenticated);
  }
  Ok(decoded.employee_id)
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;

  /// Token format: `<employee uuid>:<expiry unix seconds>`.
  struct PlainProvider;

  impl CredentialProvider for PlainProvider {
    fn decode(&self, token: &str) -> Option<DecodedCredential> {
      let (id, exp) = token.split_once(':')?;
      Some(DecodedCredential {
        employee_id: id.parse().ok()?,
        expires_at:  Utc.timestamp_opt(exp.parse().ok()?, 0).single()?,
      })
    }

    fn issue(&self, employee_id: Uuid, now: DateTime<Utc>) -> Result<IssuedCredential> {
      let expires_at = now + Duration::hours(1);
      Ok(IssuedCredential {
        token: format!("{employee_id}:{}", expires_at.timestamp()),
        employee_id,
        expires_at,
      })
    }
  }

  fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap() }

  #[test]
  fn issued_credential_resolves() {
    let id = Uuid::new_v4();
    let issued = PlainProvider.issue(id, now()).unwrap();
    let resolved =
      resolve_employee(&Credential::new(issued.token), &PlainProvider, now()).unwrap();
    assert_eq!(resolved, id);
  }

  #[test]
  fn missing_credential_is_unauthenticated() {
    let err = resolve_employee(&Credential::anonymous(), &PlainProvider, now()).unwrap_err();
    assert!(matches!(err, Error::Unauthenticated));
  }

  #[test]
  fn malformed_credential_is_unauthenticated() {
    let err =
      resolve_employee(&Credential::new("garbage"), &PlainProvider, now()).unwrap_err();
    assert!(matches!(err, Error::Unauthenticated));
  }

  #[test]
  fn expiry_must_be_strictly_in_the_future() {
    let id = Uuid::new_v4();
    let at_now = Credential::new(format!("{id}:{}", now().timestamp()));
    assert!(matches!(
      resolve_employee(&at_now, &PlainProvider, now()),
      Err(Error::Unauthenticated)
    ));

    let later = Credential::new(format!("{id}:{}", now().timestamp() + 1));
    assert_eq!(resolve_employee(&later, &PlainProvider, now()).unwrap(), id);
  }

  #[test]
  fn authorization_header_parsing() {
    assert_eq!(Credential::from_authorization(Some("Bearer abc")).token(), "abc");
    assert!(Credential::from_authorization(Some("Basic abc")).is_empty());
    assert!(Credential::from_authorization(None).is_empty());
  }

  #[test]
  fn debug_never_prints_the_token() {
    let c = Credential::new("secret-token");
    assert!(!format!("{c:?}").contains("secret"));
  }
}
