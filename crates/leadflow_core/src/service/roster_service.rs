//! Roster administration use-cases.
//!
//! # Responsibility
//! - Validate and create operators, sources and operator/source weights.
//! - List operators together with their current active contact counts.
//!
//! # Invariants
//! - Weight links are only created between existing operators and sources.
//! - Source names stay unique; duplicates are reported, not overwritten.

use crate::db::DbError;
use crate::model::roster::{
    NewOperator, NewOperatorSourceWeight, NewSource, Operator, OperatorId, OperatorLoad,
    OperatorSourceWeight, RosterValidationError, Source, SourceId,
};
use crate::repo::contact_repo::{ContactRepository, SqliteContactRepository};
use crate::repo::roster_repo::{RosterRepository, SqliteRosterRepository};
use crate::repo::{ListQuery, RepoError, RepoResult};
use log::info;
use rusqlite::{Connection, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from roster service operations.
#[derive(Debug)]
pub enum RosterServiceError {
    Validation(RosterValidationError),
    OperatorNotFound(OperatorId),
    SourceNotFound(SourceId),
    /// A source with this name already exists.
    DuplicateSourceName(String),
    Repo(RepoError),
}

impl Display for RosterServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::OperatorNotFound(id) => write!(f, "operator not found: {id}"),
            Self::SourceNotFound(id) => write!(f, "source not found: {id}"),
            Self::DuplicateSourceName(name) => write!(f, "source name already exists: `{name}`"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RosterServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RosterValidationError> for RosterServiceError {
    fn from(value: RosterValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for RosterServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type RosterServiceResult<T> = Result<T, RosterServiceError>;

/// Roster service facade over repository implementations.
pub struct RosterService<R: RosterRepository, C: ContactRepository> {
    roster: R,
    contacts: C,
}

impl<'conn> RosterService<SqliteRosterRepository<'conn>, SqliteContactRepository<'conn>> {
    /// Builds a service over SQLite repositories sharing `conn`.
    pub fn sqlite(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(Self::new(
            SqliteRosterRepository::try_new(conn)?,
            SqliteContactRepository::try_new(conn)?,
        ))
    }
}

impl<R: RosterRepository, C: ContactRepository> RosterService<R, C> {
    pub fn new(roster: R, contacts: C) -> Self {
        Self { roster, contacts }
    }

    pub fn create_operator(&self, operator: &NewOperator) -> RosterServiceResult<Operator> {
        operator.validate()?;
        let created = self.roster.create_operator(operator)?;
        info!(
            "event=operator_create module=service status=ok operator_id={} is_active={} max_active_leads={}",
            created.id, created.is_active, created.max_active_leads
        );
        Ok(created)
    }

    pub fn create_source(&self, source: &NewSource) -> RosterServiceResult<Source> {
        source.validate()?;
        let created = self.roster.create_source(source).map_err(|err| {
            if is_constraint_violation(&err) {
                RosterServiceError::DuplicateSourceName(source.name.clone())
            } else {
                RosterServiceError::Repo(err)
            }
        })?;
        info!(
            "event=source_create module=service status=ok source_id={}",
            created.id
        );
        Ok(created)
    }

    /// Links an operator to a source.
    ///
    /// # Errors
    /// - `Validation` when `weight < 1`.
    /// - `OperatorNotFound` / `SourceNotFound` when either side is missing.
    pub fn create_weight(
        &self,
        link: &NewOperatorSourceWeight,
    ) -> RosterServiceResult<OperatorSourceWeight> {
        link.validate()?;
        if self.roster.get_operator(link.operator_id)?.is_none() {
            return Err(RosterServiceError::OperatorNotFound(link.operator_id));
        }
        if self.roster.get_source(link.source_id)?.is_none() {
            return Err(RosterServiceError::SourceNotFound(link.source_id));
        }

        let created = self.roster.create_weight(link)?;
        info!(
            "event=weight_create module=service status=ok weight_id={} operator_id={} source_id={} weight={}",
            created.id, created.operator_id, created.source_id, created.weight
        );
        Ok(created)
    }

    /// Lists operators with their persisted active contact counts.
    pub fn list_operators(&self, query: &ListQuery) -> RosterServiceResult<Vec<OperatorLoad>> {
        let operators = self.roster.list_operators(query)?;
        let ids: Vec<OperatorId> = operators.iter().map(|operator| operator.id).collect();
        let counts = self.contacts.count_active_by_operator(&ids)?;

        Ok(operators
            .into_iter()
            .map(|operator| {
                let active_contacts = counts.get(&operator.id).copied().unwrap_or(0);
                OperatorLoad {
                    operator,
                    active_contacts,
                }
            })
            .collect())
    }

    pub fn get_operator(&self, id: OperatorId) -> RosterServiceResult<Option<Operator>> {
        Ok(self.roster.get_operator(id)?)
    }

    pub fn list_sources(&self, query: &ListQuery) -> RosterServiceResult<Vec<Source>> {
        Ok(self.roster.list_sources(query)?)
    }

    pub fn list_weights(&self, query: &ListQuery) -> RosterServiceResult<Vec<OperatorSourceWeight>> {
        Ok(self.roster.list_weights(query)?)
    }
}

fn is_constraint_violation(err: &RepoError) -> bool {
    matches!(
        err,
        RepoError::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(inner, _)))
            if inner.code == ErrorCode::ConstraintViolation
    )
}
