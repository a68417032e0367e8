//! Subcontracting relationships: the directed edges of the company graph.
//!
//! An edge `contractor -> subcontractor` is keyed by the ordered pair; at most
//! one exists per pair. An edge whose `end_date` has passed is *inactive* but
//! still exists: existence, not currency, is what gates document visibility.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// The composite key of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipKey {
  pub contractor_id:    Uuid,
  pub subcontractor_id: Uuid,
}

impl RelationshipKey {
  pub fn new(contractor_id: Uuid, subcontractor_id: Uuid) -> Self {
    Self { contractor_id, subcontractor_id }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
  pub contractor_id:    Uuid,
  pub subcontractor_id: Uuid,
  pub start_date:       NaiveDate,
  pub end_date:         Option<NaiveDate>,
  pub additional_info:  Option<String>,
}

impl Relationship {
  pub fn key(&self) -> RelationshipKey {
    RelationshipKey::new(self.contractor_id, self.subcontractor_id)
  }

  /// Check the per-row invariants.
  pub fn validate(&self) -> Result<()> {
    if self.contractor_id == self.subcontractor_id {
      return Err(Error::SelfRelationship(self.contractor_id));
    }
    if let Some(end) = self.end_date
      && end < self.start_date
    {
      return Err(Error::validation("end_date precedes start_date"));
    }
    Ok(())
  }
}

/// Body of a relationship creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRelationship {
  pub start_date:      NaiveDate,
  pub end_date:        Option<NaiveDate>,
  pub additional_info: Option<String>,
}

impl NewRelationship {
  pub fn into_relationship(self, key: RelationshipKey) -> Relationship {
    Relationship {
      contractor_id:    key.contractor_id,
      subcontractor_id: key.subcontractor_id,
      start_date:       self.start_date,
      end_date:         self.end_date,
      additional_info:  self.additional_info,
    }
  }
}

/// Partial update; only `Some` fields are applied. The nested `Option`s
/// distinguish "leave unchanged" (`None`) from "clear" (`Some(None)`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationshipPatch {
  pub start_date:      Option<NaiveDate>,
  #[serde(default, with = "double_option")]
  pub end_date:        Option<Option<NaiveDate>>,
  #[serde(default, with = "double_option")]
  pub additional_info: Option<Option<String>>,
}

impl RelationshipPatch {
  /// Apply the supplied fields to `rel`, leaving the key pair untouched.
  pub fn apply(self, mut rel: Relationship) -> Relationship {
    if let Some(start) = self.start_date {
      rel.start_date = start;
    }
    if let Some(end) = self.end_date {
      rel.end_date = end;
    }
    if let Some(info) = self.additional_info {
      rel.additional_info = info;
    }
    rel
  }
}

/// Serde helper: a present-but-null field becomes `Some(None)`.
mod double_option {
  use serde::{Deserialize, Deserializer, Serialize, Serializer};

  pub fn serialize<T, S>(value: &Option<Option<T>>, ser: S) -> Result<S::Ok, S::Error>
  where
    T: Serialize,
    S: Serializer,
  {
    match value {
      Some(inner) => inner.serialize(ser),
      None => ser.serialize_none(),
    }
  }

  pub fn deserialize<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
  where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
  {
    Option::<T>::deserialize(de).map(Some)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn rel() -> Relationship {
    NewRelationship {
      start_date:      date(2024, 1, 1),
      end_date:        None,
      additional_info: Some("framework contract".into()),
    }
    .into_relationship(RelationshipKey::new(Uuid::new_v4(), Uuid::new_v4()))
  }

  #[test]
  fn self_relationship_is_rejected() {
    let id = Uuid::new_v4();
    let mut r = rel();
    r.contractor_id = id;
    r.subcontractor_id = id;
    assert!(matches!(r.validate(), Err(Error::SelfRelationship(x)) if x == id));
  }

  #[test]
  fn end_before_start_is_rejected() {
    let mut r = rel();
    r.end_date = Some(date(2023, 6, 1));
    assert!(matches!(r.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn patch_distinguishes_absent_from_null() {
    let r = rel();
    let key = r.key();

    let patch: RelationshipPatch =
      serde_json::from_str(r#"{"end_date":"2024-12-31"}"#).unwrap();
    let r = patch.apply(r);
    assert_eq!(r.end_date, Some(date(2024, 12, 31)));
    assert_eq!(r.additional_info.as_deref(), Some("framework contract"));

    let patch: RelationshipPatch =
      serde_json::from_str(r#"{"additional_info":null}"#).unwrap();
    let r = patch.apply(r);
    assert_eq!(r.additional_info, None);
    assert_eq!(r.end_date, Some(date(2024, 12, 31)));
    assert_eq!(r.key(), key);
  }
}
