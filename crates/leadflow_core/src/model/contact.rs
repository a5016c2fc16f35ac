//! Contact domain model.
//!
//! # Responsibility
//! - Define one inbound interaction event and its lifecycle status.
//! - Define which statuses count against operator capacity.
//!
//! # Invariants
//! - A contact references exactly one lead and one source, and at most one
//!   operator.
//! - New contacts always start in `ContactStatus::New`.

use crate::model::lead::{LeadId, LeadIdentity};
use crate::model::roster::{OperatorId, SourceId};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Storage row id of a contact.
pub type ContactId = i64;

/// Contact lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    New,
    InProgress,
    Completed,
}

impl ContactStatus {
    /// Statuses that count against an operator's `max_active_leads`.
    pub const ACTIVE: [ContactStatus; 2] = [ContactStatus::New, ContactStatus::InProgress];

    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }

    /// Stable storage/wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl Display for ContactStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContactStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "new" => Ok(Self::New),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(format!(
                "unsupported contact status `{other}`; expected new|in_progress|completed"
            )),
        }
    }
}

/// Persisted contact record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub lead_id: LeadId,
    pub source_id: SourceId,
    /// `None` when no eligible operator had capacity at creation time.
    pub operator_id: Option<OperatorId>,
    pub message: Option<String>,
    pub status: ContactStatus,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Contact row not yet written to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
    pub lead_id: LeadId,
    pub source_id: SourceId,
    pub operator_id: Option<OperatorId>,
    pub message: Option<String>,
    pub status: ContactStatus,
}

impl NewContact {
    /// Builds a contact in the initial `new` status.
    pub fn new(
        lead_id: LeadId,
        source_id: SourceId,
        operator_id: Option<OperatorId>,
        message: Option<String>,
    ) -> Self {
        Self {
            lead_id,
            source_id,
            operator_id,
            message,
            status: ContactStatus::New,
        }
    }

    /// Returns the operator whose capacity this row consumes, if any.
    pub fn active_operator(&self) -> Option<OperatorId> {
        self.operator_id.filter(|_| self.status.is_active())
    }
}

/// Inbound contact event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateContactRequest {
    pub source_id: SourceId,
    #[serde(flatten)]
    pub identity: LeadIdentity,
    #[serde(default)]
    pub message: Option<String>,
}

impl CreateContactRequest {
    pub fn new(source_id: SourceId, identity: LeadIdentity) -> Self {
        Self {
            source_id,
            identity,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{ContactStatus, CreateContactRequest, NewContact};

    #[test]
    fn only_new_and_in_progress_are_active() {
        assert!(ContactStatus::New.is_active());
        assert!(ContactStatus::InProgress.is_active());
        assert!(!ContactStatus::Completed.is_active());
    }

    #[test]
    fn status_parses_its_own_representation() {
        for status in [
            ContactStatus::New,
            ContactStatus::InProgress,
            ContactStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<ContactStatus>(), Ok(status));
        }
        assert!("closed".parse::<ContactStatus>().is_err());
    }

    #[test]
    fn completed_contact_does_not_consume_capacity() {
        let mut contact = NewContact::new(1, 1, Some(7), None);
        assert_eq!(contact.active_operator(), Some(7));
        contact.status = ContactStatus::Completed;
        assert_eq!(contact.active_operator(), None);
    }

    #[test]
    fn request_reads_flat_identity_fields() {
        let request: CreateContactRequest = serde_json::from_str(
            r#"{"source_id": 2, "phone": "555-1234", "name": "John", "message": "Hi"}"#,
        )
        .unwrap();
        assert_eq!(request.source_id, 2);
        assert_eq!(request.identity.phone.as_deref(), Some("555-1234"));
        assert_eq!(request.identity.external_id, None);
        assert_eq!(request.message.as_deref(), Some("Hi"));
    }

    #[test]
    fn status_serializes_as_snake_case() {
        let json = serde_json::to_string(&ContactStatus::InProgress).unwrap();
        assert_eq!(json, r#""in_progress""#);
    }
}
