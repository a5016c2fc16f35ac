//! Contact repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Insert contacts and read them back with storage-assigned fields.
//! - Update contact status.
//! - Count active contacts per operator in one batched query.
//!
//! # Invariants
//! - Only `ContactStatus::ACTIVE` statuses are counted as operator load.
//! - Counts see every row visible to the connection, including rows inserted
//!   earlier in the same open transaction.

use crate::model::contact::{Contact, ContactId, ContactStatus, NewContact};
use crate::model::roster::OperatorId;
use crate::repo::{column_u32, ensure_schema_ready, ListQuery, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::BTreeMap;

const CONTACT_SELECT_SQL: &str =
    "SELECT id, lead_id, source_id, operator_id, message, status, created_at FROM contacts";

/// Repository interface for contact persistence and load counting.
pub trait ContactRepository {
    fn insert_contact(&self, contact: &NewContact) -> RepoResult<Contact>;
    fn get_contact(&self, id: ContactId) -> RepoResult<Option<Contact>>;
    fn list_contacts(&self, query: &ListQuery) -> RepoResult<Vec<Contact>>;
    /// Sets the status of one contact. Setting the current status is a no-op
    /// that still succeeds.
    fn update_status(&self, id: ContactId, status: ContactStatus) -> RepoResult<Contact>;
    /// Active contact counts keyed by operator. Operators without active
    /// contacts are absent from the map.
    fn count_active_by_operator(
        &self,
        operator_ids: &[OperatorId],
    ) -> RepoResult<BTreeMap<OperatorId, u32>>;
}

/// SQLite-backed contact repository.
pub struct SqliteContactRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContactRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn, &["contacts"])?;
        Ok(Self { conn })
    }
}

impl ContactRepository for SqliteContactRepository<'_> {
    fn insert_contact(&self, contact: &NewContact) -> RepoResult<Contact> {
        self.conn.execute(
            "INSERT INTO contacts (lead_id, source_id, operator_id, message, status)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                contact.lead_id,
                contact.source_id,
                contact.operator_id,
                contact.message.as_deref(),
                contact.status.as_str(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        self.get_contact(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("inserted contact {id} not found in read-back"))
        })
    }

    fn get_contact(&self, id: ContactId) -> RepoResult<Option<Contact>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONTACT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_contact_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_contacts(&self, query: &ListQuery) -> RepoResult<Vec<Contact>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CONTACT_SELECT_SQL} ORDER BY id ASC LIMIT ?1 OFFSET ?2;"
        ))?;
        let mut rows = stmt.query(params![
            i64::from(query.applied_limit()),
            i64::from(query.offset)
        ])?;
        let mut contacts = Vec::new();
        while let Some(row) = rows.next()? {
            contacts.push(parse_contact_row(row)?);
        }
        Ok(contacts)
    }

    fn update_status(&self, id: ContactId, status: ContactStatus) -> RepoResult<Contact> {
        let changed = self.conn.execute(
            "UPDATE contacts SET status = ?1 WHERE id = ?2;",
            params![status.as_str(), id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "contact",
                id,
            });
        }

        self.get_contact(id)?.ok_or(RepoError::NotFound {
            entity: "contact",
            id,
        })
    }

    fn count_active_by_operator(
        &self,
        operator_ids: &[OperatorId],
    ) -> RepoResult<BTreeMap<OperatorId, u32>> {
        let mut counts = BTreeMap::new();
        if operator_ids.is_empty() {
            return Ok(counts);
        }

        let id_placeholders = vec!["?"; operator_ids.len()].join(", ");
        let status_placeholders = vec!["?"; ContactStatus::ACTIVE.len()].join(", ");
        let sql = format!(
            "SELECT operator_id, COUNT(*) AS active_count
             FROM contacts
             WHERE operator_id IN ({id_placeholders})
               AND status IN ({status_placeholders})
             GROUP BY operator_id;"
        );

        let mut bind_values: Vec<Value> = operator_ids
            .iter()
            .map(|id| Value::Integer(*id))
            .collect();
        bind_values.extend(
            ContactStatus::ACTIVE
                .iter()
                .map(|status| Value::Text(status.as_str().to_string())),
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        while let Some(row) = rows.next()? {
            let operator_id: OperatorId = row.get("operator_id")?;
            let count = column_u32(row.get("active_count")?, "contacts.count")?;
            counts.insert(operator_id, count);
        }
        Ok(counts)
    }
}

fn parse_contact_row(row: &Row<'_>) -> RepoResult<Contact> {
    let status_text: String = row.get("status")?;
    let status = status_text.parse::<ContactStatus>().map_err(|_| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in contacts.status"))
    })?;

    Ok(Contact {
        id: row.get("id")?,
        lead_id: row.get("lead_id")?,
        source_id: row.get("source_id")?,
        operator_id: row.get("operator_id")?,
        message: row.get("message")?,
        status,
        created_at: row.get("created_at")?,
    })
}
