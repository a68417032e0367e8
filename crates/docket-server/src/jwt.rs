//! HS256 JSON Web Tokens as Docket credentials.
//!
//! The token carries the employee id in `sub` and its expiry in `exp`.
//! Signature checking happens here; the expiry comparison is left to the
//! engine, which asks its own clock, so `jsonwebtoken`'s built-in `exp`
//! validation is switched off.

use chrono::{DateTime, Duration, TimeZone, Utc};
use docket_core::identity::{CredentialProvider, DecodedCredential, IssuedCredential};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
  sub: Uuid,
  iat: i64,
  exp: i64,
}

pub struct JwtCredentials {
  encoding:   EncodingKey,
  decoding:   DecodingKey,
  validation: Validation,
  ttl:        Duration,
}

impl JwtCredentials {
  pub fn new(secret: &[u8], ttl: Duration) -> Self {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.leeway = 0;
    Self {
      encoding: EncodingKey::from_secret(secret),
      decoding: DecodingKey::from_secret(secret),
      validation,
      ttl,
    }
  }
}

impl CredentialProvider for JwtCredentials {
  fn decode(&self, token: &str) -> Option<DecodedCredential> {
    let data = decode::<Claims>(token, &self.decoding, &self.validation).ok()?;
    Some(DecodedCredential {
      employee_id: data.claims.sub,
      expires_at:  Utc.timestamp_opt(data.claims.exp, 0).single()?,
    })
  }

  fn issue(&self, employee_id: Uuid, now: DateTime<Utc>) -> docket_core::Result<IssuedCredential> {
    let expires_at = now + self.ttl;
    let claims = Claims {
      sub: employee_id,
      iat: now.timestamp(),
      exp: expires_at.timestamp(),
    };
    let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
      .map_err(|e| docket_core::Error::Credentials(Box::new(Error::Jwt(e))))?;
    Ok(IssuedCredential { token, employee_id, expires_at })
  }
}

#[cfg(test)]
mod tests {
  use docket_core::identity::{Credential, resolve_employee};

  use super::*;

  fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap() }

  #[test]
  fn issued_token_decodes_to_the_same_employee() {
    let jwt = JwtCredentials::new(b"test-secret", Duration::hours(1));
    let id = Uuid::new_v4();
    let issued = jwt.issue(id, now()).unwrap();

    let decoded = jwt.decode(&issued.token).unwrap();
    assert_eq!(decoded.employee_id, id);
    assert_eq!(decoded.expires_at, now() + Duration::hours(1));
  }

  #[test]
  fn expiry_is_judged_by_the_callers_clock() {
    let jwt = JwtCredentials::new(b"test-secret", Duration::hours(1));
    let id = Uuid::new_v4();
    // Issued long ago: still decodes, but no longer resolves.
    let issued = jwt.issue(id, Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()).unwrap();
    assert!(jwt.decode(&issued.token).is_some());

    let cred = Credential::new(issued.token);
    assert!(resolve_employee(&cred, &jwt, now()).is_err());
    assert!(resolve_employee(&cred, &jwt, Utc.with_ymd_and_hms(2020, 1, 1, 0, 30, 0).unwrap()).is_ok());
  }

  #[test]
  fn foreign_signatures_are_rejected() {
    let ours = JwtCredentials::new(b"ours", Duration::hours(1));
    let theirs = JwtCredentials::new(b"theirs", Duration::hours(1));
    let issued = theirs.issue(Uuid::new_v4(), now()).unwrap();

    assert!(ours.decode(&issued.token).is_none());
    assert!(ours.decode("not.a.jwt").is_none());
  }
}
