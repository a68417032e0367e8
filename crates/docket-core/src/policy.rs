//! The access policy: one decision table for every read and write.
//!
//! [`can_access`] is a pure function. Everything it needs about the company
//! graph is passed in as [`GraphFacts`], which the caller looks up first; the
//! function itself performs no I/O and holds no state.
//!
//! | # | Action | Allowed when |
//! |---|--------|--------------|
//! | 1 | `ReadOwnCompanyDocs` | target's subcontractor is the actor's company |
//! | 2 | `ReadAsContractor` | actor's company hires the target's subcontractor |
//! | 3 | `WriteValidationState` | actor's company hires the target's subcontractor |
//! | 4 | `WriteContent` (employee scope) | actor is the document's employee, or hiring |
//! | 5 | `WriteContent` (company scope) | actor works for the subcontractor, or hiring |
//! | 6 | `Delete` | actor works for the subcontractor, or hiring |
//! | 7 | `ManageRelationship` | actor works for the target's contractor |
//! | – | anything else | denied |

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  document::Document,
  identity::Actor,
  relationship::RelationshipKey,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
  ReadOwnCompanyDocs,
  ReadAsContractor,
  WriteValidationState,
  /// Name, dates, additional info, or the attachment.
  WriteContent,
  Delete,
  ManageRelationship,
}

/// What an action is aimed at: a document (existing or prospective) or a
/// relationship edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
  pub contractor_id:    Uuid,
  pub subcontractor_id: Uuid,
  pub employee_id:      Option<Uuid>,
}

impl From<&Document> for Target {
  fn from(doc: &Document) -> Self {
    Self {
      contractor_id:    doc.contractor_id,
      subcontractor_id: doc.subcontractor_id,
      employee_id:      doc.employee_id,
    }
  }
}

impl From<RelationshipKey> for Target {
  fn from(key: RelationshipKey) -> Self {
    Self {
      contractor_id:    key.contractor_id,
      subcontractor_id: key.subcontractor_id,
      employee_id:      None,
    }
  }
}

/// Facts about the company graph relevant to one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphFacts {
  /// `is_hiring(actor.company_id, target.subcontractor_id)`.
  pub actor_hires_subcontractor: bool,
}

impl GraphFacts {
  pub fn hiring(actor_hires_subcontractor: bool) -> Self {
    Self { actor_hires_subcontractor }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
  /// The actor's company neither owns the target nor hires its owner.
  NotOwnerOrContractor,
  /// Only the contractor side may decide a document's validation state.
  ContractorOnly,
  /// An employee-scope document belongs to someone else.
  NotDocumentEmployee,
  /// Relationship edges are managed by their contractor.
  NotRelationshipContractor,
}

impl fmt::Display for DenyReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::NotOwnerOrContractor => "not the owning company or its contractor",
      Self::ContractorOnly => "only the contractor may validate",
      Self::NotDocumentEmployee => "document belongs to another employee",
      Self::NotRelationshipContractor => "not the relationship's contractor",
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  Allow,
  Deny(DenyReason),
}

impl Decision {
  pub fn is_allowed(self) -> bool { matches!(self, Self::Allow) }

  /// Turn a deny into [`Error::Forbidden`].
  pub fn into_result(self, action: Action) -> Result<()> {
    match self {
      Self::Allow => Ok(()),
      Self::Deny(reason) => Err(Error::Forbidden { action, reason }),
    }
  }
}

fn allow_if(cond: bool, reason: DenyReason) -> Decision {
  if cond { Decision::Allow } else { Decision::Deny(reason) }
}

pub fn can_access(actor: &Actor, action: Action, target: &Target, graph: GraphFacts) -> Decision {
  let own_company = actor.company_id == target.subcontractor_id;
  let hiring = graph.actor_hires_subcontractor;

  match action {
    Action::ReadOwnCompanyDocs => allow_if(own_company, DenyReason::NotOwnerOrContractor),
    Action::ReadAsContractor => allow_if(hiring, DenyReason::NotOwnerOrContractor),
    Action::WriteValidationState => allow_if(hiring, DenyReason::ContractorOnly),
    Action::WriteContent => match target.employee_id {
      Some(employee_id) => allow_if(
        actor.employee_id == employee_id || hiring,
        DenyReason::NotDocumentEmployee,
      ),
      None => allow_if(own_company || hiring, DenyReason::NotOwnerOrContractor),
    },
    Action::Delete => allow_if(own_company || hiring, DenyReason::NotOwnerOrContractor),
    Action::ManageRelationship => allow_if(
      actor.company_id == target.contractor_id,
      DenyReason::NotRelationshipContractor,
    ),
  }
}

/// Either read rule: own company (rule 1) or contractor (rule 2).
pub fn can_read(actor: &Actor, target: &Target, graph: GraphFacts) -> Decision {
  match can_access(actor, Action::ReadOwnCompanyDocs, target, graph) {
    Decision::Allow => Decision::Allow,
    Decision::Deny(_) => can_access(actor, Action::ReadAsContractor, target, graph),
  }
}
