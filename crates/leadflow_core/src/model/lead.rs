//! Lead domain model.
//!
//! # Responsibility
//! - Define the canonical customer record deduplicated across contacts.
//! - Normalize and validate identity fields supplied by contact events.
//!
//! # Invariants
//! - `external_id`, when present, is unique across leads.
//! - Leads are never merged or deleted by the distribution engine.
//! - Blank identity values are treated as absent.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage row id of a lead.
pub type LeadId = i64;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("valid email regex"));

/// Canonical customer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub external_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Identity fields carried by one contact event.
///
/// Used both as the dedup lookup key set and as the payload of a new lead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadIdentity {
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl LeadIdentity {
    pub fn with_external_id(mut self, value: impl Into<String>) -> Self {
        self.external_id = Some(value.into());
        self
    }

    pub fn with_phone(mut self, value: impl Into<String>) -> Self {
        self.phone = Some(value.into());
        self
    }

    pub fn with_email(mut self, value: impl Into<String>) -> Self {
        self.email = Some(value.into());
        self
    }

    pub fn with_name(mut self, value: impl Into<String>) -> Self {
        self.name = Some(value.into());
        self
    }

    /// Returns a copy with blank fields collapsed to `None`.
    ///
    /// Non-blank values are kept byte-for-byte; lookups match them exactly.
    pub fn normalized(&self) -> Self {
        Self {
            external_id: non_blank(self.external_id.as_deref()),
            phone: non_blank(self.phone.as_deref()),
            email: non_blank(self.email.as_deref()),
            name: non_blank(self.name.as_deref()),
        }
    }

    /// Returns whether no dedup key (`external_id`, `phone`, `email`) is present.
    pub fn has_no_keys(&self) -> bool {
        self.external_id.is_none() && self.phone.is_none() && self.email.is_none()
    }

    /// Validates field shapes. Blank fields count as absent and pass.
    ///
    /// # Errors
    /// - `InvalidEmail` when `email` is non-blank and not address-shaped,
    ///   including surrounding whitespace.
    pub fn validate(&self) -> Result<(), LeadValidationError> {
        if let Some(email) = self.normalized().email.as_deref() {
            if !EMAIL_RE.is_match(email) {
                return Err(LeadValidationError::InvalidEmail(email.to_string()));
            }
        }
        Ok(())
    }
}

/// Identity validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeadValidationError {
    InvalidEmail(String),
}

impl Display for LeadValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEmail(value) => write!(f, "invalid email address: `{value}`"),
        }
    }
}

impl Error for LeadValidationError {}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::{LeadIdentity, LeadValidationError};

    #[test]
    fn normalized_drops_blank_fields_and_keeps_exact_values() {
        let identity = LeadIdentity::default()
            .with_external_id("  ")
            .with_phone("555-1234")
            .with_email("")
            .with_name("John Doe");

        let normalized = identity.normalized();
        assert_eq!(normalized.external_id, None);
        assert_eq!(normalized.phone.as_deref(), Some("555-1234"));
        assert_eq!(normalized.email, None);
        assert_eq!(normalized.name.as_deref(), Some("John Doe"));
        assert!(!normalized.has_no_keys());
    }

    #[test]
    fn name_alone_is_not_a_dedup_key() {
        let identity = LeadIdentity::default().with_name("Only Name");
        assert!(identity.normalized().has_no_keys());
    }

    #[test]
    fn validate_accepts_plain_addresses() {
        let identity = LeadIdentity::default().with_email("test@example.com");
        assert!(identity.validate().is_ok());
    }

    #[test]
    fn validate_treats_blank_email_as_absent() {
        for blank in ["", "   "] {
            let identity = LeadIdentity::default().with_phone("+1").with_email(blank);
            assert_eq!(identity.validate(), Ok(()));
        }
    }

    #[test]
    fn validate_rejects_malformed_addresses() {
        for bad in [
            "no-at-sign",
            "a@b",
            "two@@example.com",
            "sp ace@example.com",
            " padded@example.com ",
        ] {
            let identity = LeadIdentity::default().with_email(bad);
            assert_eq!(
                identity.validate(),
                Err(LeadValidationError::InvalidEmail(bad.to_string())),
                "expected `{bad}` to be rejected"
            );
        }
    }
}
