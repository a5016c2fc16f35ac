//! Contact creation orchestrator and contact use-cases.
//!
//! # Responsibility
//! - Run lead resolution, operator assignment and contact persistence as one
//!   unit of work.
//! - Import batches of contacts in a single unit of work.
//! - Provide status update and listing entry points.
//!
//! # Invariants
//! - A failed creation leaves no lead or contact behind.
//! - No eligible operator is not a failure: the contact is stored unassigned.
//! - Failures are never retried here; they propagate to the caller.

use crate::db::{DbError, UnitOfWork};
use crate::distribution::assignment::{assign_operator, Assignment};
use crate::distribution::dedup::{resolve_lead, LeadResolution};
use crate::model::contact::{Contact, ContactId, ContactStatus, CreateContactRequest, NewContact};
use crate::model::lead::{Lead, LeadValidationError};
use crate::repo::contact_repo::{ContactRepository, SqliteContactRepository};
use crate::repo::lead_repo::{LeadRepository, SqliteLeadRepository};
use crate::repo::{ListQuery, RepoError};
use log::{debug, error, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for contact use-cases.
#[derive(Debug)]
pub enum ContactServiceError {
    /// Identity fields failed validation; nothing was written.
    InvalidIdentity(LeadValidationError),
    ContactNotFound(ContactId),
    /// Persistence failure, propagated unchanged.
    Repo(RepoError),
}

impl Display for ContactServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidIdentity(err) => write!(f, "{err}"),
            Self::ContactNotFound(id) => write!(f, "contact not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ContactServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidIdentity(err) => Some(err),
            Self::ContactNotFound(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<LeadValidationError> for ContactServiceError {
    fn from(value: LeadValidationError) -> Self {
        Self::InvalidIdentity(value)
    }
}

impl From<RepoError> for ContactServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "contact",
                id,
            } => Self::ContactNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<DbError> for ContactServiceError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::Db(value))
    }
}

pub type ContactServiceResult<T> = Result<T, ContactServiceError>;

/// Contact use-case service.
///
/// Owns the random source used for operator selection; seed it for
/// reproducible assignments.
pub struct ContactService<R: Rng> {
    rng: R,
}

impl ContactService<StdRng> {
    /// Creates a service drawing from an OS-seeded generator.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> ContactService<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Creates one contact in its own unit of work and commits it.
    ///
    /// # Errors
    /// - `InvalidIdentity` before any write when the email is malformed.
    /// - `Repo` when any storage step fails, including an unknown source id;
    ///   the unit of work is rolled back.
    pub fn create_contact(
        &mut self,
        conn: &mut Connection,
        request: &CreateContactRequest,
    ) -> ContactServiceResult<Contact> {
        let started_at = Instant::now();
        request.identity.validate()?;

        let result = UnitOfWork::begin(conn)
            .map_err(ContactServiceError::from)
            .and_then(|mut uow| {
                let created = self.create_contact_in(&mut uow, request)?;
                uow.commit()?;
                Ok(created)
            });

        match result {
            Ok(created) => {
                info!(
                    "event=contact_create module=service status=ok contact_id={} lead_id={} source_id={} operator_id={} duration_ms={}",
                    created.id,
                    created.lead_id,
                    created.source_id,
                    display_operator(created.operator_id),
                    started_at.elapsed().as_millis()
                );
                Ok(created)
            }
            Err(err) => {
                error!(
                    "event=contact_create module=service status=error source_id={} duration_ms={} error={}",
                    request.source_id,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Creates one contact inside a caller-owned unit of work.
    ///
    /// The contact is inserted immediately and is visible to later load
    /// accounting in the same unit of work. The caller commits or rolls back.
    pub fn create_contact_in(
        &mut self,
        uow: &mut UnitOfWork<'_>,
        request: &CreateContactRequest,
    ) -> ContactServiceResult<Contact> {
        request.identity.validate()?;
        let new_contact = self.prepare_contact(uow, request)?;
        let repo = SqliteContactRepository::try_new(uow.connection())?;
        Ok(repo.insert_contact(&new_contact)?)
    }

    /// Creates a batch of contacts in one unit of work.
    ///
    /// Each contact is staged rather than inserted until commit; later
    /// assignments in the batch still count earlier staged contacts. Either
    /// the whole batch is stored or none of it.
    pub fn import_contacts(
        &mut self,
        conn: &mut Connection,
        requests: &[CreateContactRequest],
    ) -> ContactServiceResult<Vec<Contact>> {
        let started_at = Instant::now();
        for request in requests {
            request.identity.validate()?;
        }

        match self.import_batch(conn, requests) {
            Ok(imported) => {
                let assigned = imported
                    .iter()
                    .filter(|contact| contact.operator_id.is_some())
                    .count();
                info!(
                    "event=contact_import module=service status=ok contacts={} assigned={} duration_ms={}",
                    imported.len(),
                    assigned,
                    started_at.elapsed().as_millis()
                );
                Ok(imported)
            }
            Err(err) => {
                error!(
                    "event=contact_import module=service status=error requests={} duration_ms={} error={}",
                    requests.len(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn import_batch(
        &mut self,
        conn: &mut Connection,
        requests: &[CreateContactRequest],
    ) -> ContactServiceResult<Vec<Contact>> {
        let mut uow = UnitOfWork::begin(conn)?;
        for request in requests {
            let new_contact = self.prepare_contact(&uow, request)?;
            uow.stage_contact(new_contact);
        }
        Ok(uow.commit()?)
    }

    /// Sets a contact's status. Any of the three statuses is accepted from any
    /// other, and repeating the current status is a successful no-op.
    pub fn update_contact_status(
        &self,
        conn: &Connection,
        contact_id: ContactId,
        status: ContactStatus,
    ) -> ContactServiceResult<Contact> {
        let repo = SqliteContactRepository::try_new(conn)?;
        let updated = repo.update_status(contact_id, status)?;
        info!(
            "event=contact_status_update module=service status=ok contact_id={} new_status={}",
            contact_id, status
        );
        Ok(updated)
    }

    pub fn get_contact(
        &self,
        conn: &Connection,
        contact_id: ContactId,
    ) -> ContactServiceResult<Option<Contact>> {
        let repo = SqliteContactRepository::try_new(conn)?;
        Ok(repo.get_contact(contact_id)?)
    }

    pub fn list_contacts(
        &self,
        conn: &Connection,
        query: &ListQuery,
    ) -> ContactServiceResult<Vec<Contact>> {
        let repo = SqliteContactRepository::try_new(conn)?;
        Ok(repo.list_contacts(query)?)
    }

    pub fn list_leads(&self, conn: &Connection, query: &ListQuery) -> ContactServiceResult<Vec<Lead>> {
        let repo = SqliteLeadRepository::try_new(conn)?;
        Ok(repo.list_leads(query)?)
    }

    fn prepare_contact(
        &mut self,
        uow: &UnitOfWork<'_>,
        request: &CreateContactRequest,
    ) -> ContactServiceResult<NewContact> {
        let resolution = {
            let leads = SqliteLeadRepository::try_new(uow.connection())?;
            resolve_lead(&leads, &request.identity)?
        };
        let assignment = assign_operator(uow, request.source_id, &mut self.rng)?;
        log_decision(request, &resolution, &assignment);

        Ok(NewContact::new(
            resolution.lead_id(),
            request.source_id,
            assignment.operator_id(),
            request.message.clone(),
        ))
    }
}

fn log_decision(request: &CreateContactRequest, resolution: &LeadResolution, assignment: &Assignment) {
    debug!(
        "event=contact_route module=service status=ok source_id={} lead_id={} lead_match={} operator_id={}",
        request.source_id,
        resolution.lead_id(),
        resolution.label(),
        display_operator(assignment.operator_id())
    );
}

fn display_operator(operator_id: Option<i64>) -> String {
    operator_id.map_or_else(|| "none".to_string(), |id| id.to_string())
}
