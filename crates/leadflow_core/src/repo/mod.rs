//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the explicit queries the distribution engine and services need.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repositories are only constructed over fully migrated connections.
//! - Repository APIs return semantic errors (`NotFound`, `InvalidData`) in
//!   addition to DB transport errors.
//! - Repositories never open or commit transactions; callers own unit-of-work
//!   boundaries.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod contact_repo;
pub mod lead_repo;
pub mod roster_repo;

/// Default page size for list queries.
pub const LIST_DEFAULT_LIMIT: u32 = 100;
/// Upper bound for list page size.
pub const LIST_LIMIT_MAX: u32 = 1000;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence failure surfaced by any repository.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Target row does not exist.
    NotFound { entity: &'static str, id: i64 },
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Pagination options shared by list queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Defaults to 100 and clamps to 1000.
    pub limit: Option<u32>,
    pub offset: u32,
}

impl ListQuery {
    pub fn page(limit: u32, offset: u32) -> Self {
        Self {
            limit: Some(limit),
            offset,
        }
    }

    /// Effective limit after applying default and upper bound.
    pub fn applied_limit(&self) -> u32 {
        match self.limit {
            None | Some(0) => LIST_DEFAULT_LIMIT,
            Some(value) if value > LIST_LIMIT_MAX => LIST_LIMIT_MAX,
            Some(value) => value,
        }
    }
}

/// Verifies that `conn` is migrated and carries the given tables.
pub(crate) fn ensure_schema_ready(conn: &Connection, tables: &[&'static str]) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &table in tables {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

/// Converts a non-negative SQLite integer into `u32`.
pub(crate) fn column_u32(value: i64, column: &str) -> RepoResult<u32> {
    u32::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("value `{value}` out of range in {column}")))
}

pub(crate) fn column_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

#[cfg(test)]
mod tests {
    use super::{ListQuery, LIST_DEFAULT_LIMIT, LIST_LIMIT_MAX};

    #[test]
    fn applied_limit_defaults_and_clamps() {
        assert_eq!(ListQuery::default().applied_limit(), LIST_DEFAULT_LIMIT);
        assert_eq!(ListQuery::page(0, 0).applied_limit(), LIST_DEFAULT_LIMIT);
        assert_eq!(ListQuery::page(25, 0).applied_limit(), 25);
        assert_eq!(ListQuery::page(5000, 0).applied_limit(), LIST_LIMIT_MAX);
    }
}
