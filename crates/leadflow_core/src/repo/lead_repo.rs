//! Lead identity store: point lookups and inserts.
//!
//! # Responsibility
//! - Resolve leads by exact `external_id`, `phone` or `email`.
//! - Insert new leads and hand back their row id inside the caller's
//!   transaction.
//!
//! # Invariants
//! - Lookups are exact string matches; normalization happens above this layer.
//! - `phone`/`email` are not unique, so lookups return the oldest match.

use crate::model::lead::{Lead, LeadId, LeadIdentity};
use crate::repo::{ensure_schema_ready, ListQuery, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const LEAD_SELECT_SQL: &str = "SELECT id, external_id, phone, email, name, created_at FROM leads";

/// Repository interface for lead identity lookups.
pub trait LeadRepository {
    fn find_by_external_id(&self, external_id: &str) -> RepoResult<Option<Lead>>;
    fn find_by_phone(&self, phone: &str) -> RepoResult<Option<Lead>>;
    fn find_by_email(&self, email: &str) -> RepoResult<Option<Lead>>;
    /// Inserts a lead and returns its id, usable as a foreign key before commit.
    fn insert_lead(&self, identity: &LeadIdentity) -> RepoResult<LeadId>;
    fn get_lead(&self, id: LeadId) -> RepoResult<Option<Lead>>;
    fn list_leads(&self, query: &ListQuery) -> RepoResult<Vec<Lead>>;
}

/// SQLite-backed lead repository.
pub struct SqliteLeadRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLeadRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn, &["leads"])?;
        Ok(Self { conn })
    }

    fn find_one(&self, column: &'static str, value: &str) -> RepoResult<Option<Lead>> {
        let lead = self
            .conn
            .query_row(
                &format!("{LEAD_SELECT_SQL} WHERE {column} = ?1 ORDER BY id ASC LIMIT 1;"),
                [value],
                parse_lead_row,
            )
            .optional()?;
        Ok(lead)
    }
}

impl LeadRepository for SqliteLeadRepository<'_> {
    fn find_by_external_id(&self, external_id: &str) -> RepoResult<Option<Lead>> {
        self.find_one("external_id", external_id)
    }

    fn find_by_phone(&self, phone: &str) -> RepoResult<Option<Lead>> {
        self.find_one("phone", phone)
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<Lead>> {
        self.find_one("email", email)
    }

    fn insert_lead(&self, identity: &LeadIdentity) -> RepoResult<LeadId> {
        self.conn.execute(
            "INSERT INTO leads (external_id, phone, email, name) VALUES (?1, ?2, ?3, ?4);",
            params![
                identity.external_id.as_deref(),
                identity.phone.as_deref(),
                identity.email.as_deref(),
                identity.name.as_deref(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_lead(&self, id: LeadId) -> RepoResult<Option<Lead>> {
        let lead = self
            .conn
            .query_row(
                &format!("{LEAD_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_lead_row,
            )
            .optional()?;
        Ok(lead)
    }

    fn list_leads(&self, query: &ListQuery) -> RepoResult<Vec<Lead>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LEAD_SELECT_SQL} ORDER BY id ASC LIMIT ?1 OFFSET ?2;"
        ))?;
        let leads = stmt
            .query_map(
                params![i64::from(query.applied_limit()), i64::from(query.offset)],
                parse_lead_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(leads)
    }
}

fn parse_lead_row(row: &Row<'_>) -> rusqlite::Result<Lead> {
    Ok(Lead {
        id: row.get("id")?,
        external_id: row.get("external_id")?,
        phone: row.get("phone")?,
        email: row.get("email")?,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
    })
}
