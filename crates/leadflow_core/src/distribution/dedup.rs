//! Lead deduplication resolver.
//!
//! # Responsibility
//! - Find the canonical lead for a contact event, or create one.
//!
//! # Invariants
//! - Keys are tried in fixed priority: `external_id`, then `phone`, then
//!   `email`. The first key that matches wins; lower-priority keys are not
//!   consulted and conflicting matches are neither merged nor reported.
//! - A key that is present but unmatched falls through to the next key.
//! - With no keys present, a new lead is always created.

use crate::model::lead::{LeadId, LeadIdentity};
use crate::repo::lead_repo::LeadRepository;
use crate::repo::RepoResult;
use log::debug;

/// Identity key that matched an existing lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadMatch {
    ExternalId,
    Phone,
    Email,
}

impl LeadMatch {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExternalId => "external_id",
            Self::Phone => "phone",
            Self::Email => "email",
        }
    }
}

/// Outcome of lead resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadResolution {
    Matched { lead_id: LeadId, matched_by: LeadMatch },
    Created { lead_id: LeadId },
}

impl LeadResolution {
    pub fn lead_id(&self) -> LeadId {
        match self {
            Self::Matched { lead_id, .. } | Self::Created { lead_id } => *lead_id,
        }
    }

    /// Short label for log lines: the matched key, or `created`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Matched { matched_by, .. } => matched_by.as_str(),
            Self::Created { .. } => "created",
        }
    }
}

/// Resolves `identity` to an existing lead or inserts a new one.
///
/// Blank fields are treated as absent. A created lead's id is returned while
/// the caller's transaction is still open, so it can be used as a foreign key
/// right away.
pub fn resolve_lead<R>(repo: &R, identity: &LeadIdentity) -> RepoResult<LeadResolution>
where
    R: LeadRepository + ?Sized,
{
    let identity = identity.normalized();

    if let Some(external_id) = identity.external_id.as_deref() {
        if let Some(lead) = repo.find_by_external_id(external_id)? {
            return Ok(matched(lead.id, LeadMatch::ExternalId));
        }
    }
    if let Some(phone) = identity.phone.as_deref() {
        if let Some(lead) = repo.find_by_phone(phone)? {
            return Ok(matched(lead.id, LeadMatch::Phone));
        }
    }
    if let Some(email) = identity.email.as_deref() {
        if let Some(lead) = repo.find_by_email(email)? {
            return Ok(matched(lead.id, LeadMatch::Email));
        }
    }

    let lead_id = repo.insert_lead(&identity)?;
    debug!(
        "event=lead_resolve module=distribution status=ok outcome=created lead_id={} had_keys={}",
        lead_id,
        !identity.has_no_keys()
    );
    Ok(LeadResolution::Created { lead_id })
}

fn matched(lead_id: LeadId, matched_by: LeadMatch) -> LeadResolution {
    debug!(
        "event=lead_resolve module=distribution status=ok outcome=matched matched_by={} lead_id={}",
        matched_by.as_str(),
        lead_id
    );
    LeadResolution::Matched {
        lead_id,
        matched_by,
    }
}
