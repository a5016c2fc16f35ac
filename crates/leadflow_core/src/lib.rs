//! Core domain logic for Leadflow lead distribution.
//! This crate is the single source of truth for routing and dedup invariants.

pub mod config;
pub mod db;
pub mod distribution;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::CoreConfig;
pub use db::{open_db, open_db_in_memory, DbError, DbResult, UnitOfWork};
pub use distribution::assignment::{assign_operator, Assignment, NoOperatorReason};
pub use distribution::dedup::{resolve_lead, LeadMatch, LeadResolution};
pub use distribution::load::{active_count_for_operator, ActiveLoad};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::contact::{Contact, ContactId, ContactStatus, CreateContactRequest, NewContact};
pub use model::lead::{Lead, LeadId, LeadIdentity, LeadValidationError};
pub use model::roster::{
    EligibleWeight, NewOperator, NewOperatorSourceWeight, NewSource, Operator, OperatorId,
    OperatorLoad, OperatorSourceWeight, RosterValidationError, Source, SourceId, WeightId,
};
pub use repo::contact_repo::{ContactRepository, SqliteContactRepository};
pub use repo::lead_repo::{LeadRepository, SqliteLeadRepository};
pub use repo::roster_repo::{RosterRepository, SqliteRosterRepository};
pub use repo::{ListQuery, RepoError, RepoResult};
pub use service::contact_service::{ContactService, ContactServiceError, ContactServiceResult};
pub use service::roster_service::{RosterService, RosterServiceError, RosterServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
