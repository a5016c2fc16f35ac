//! Roster repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist operators, sources and operator/source weight links.
//! - Provide the eligibility query consumed by the assignment engine.
//!
//! # Invariants
//! - `eligible_weights` only returns rows whose operator is active.
//! - `eligible_weights` is ordered by `operator_id ASC, weight_id ASC` so the
//!   cumulative-weight walk is reproducible for a given draw.

use crate::model::roster::{
    EligibleWeight, NewOperator, NewOperatorSourceWeight, NewSource, Operator, OperatorId,
    OperatorSourceWeight, Source, SourceId,
};
use crate::repo::{column_bool, column_u32, ensure_schema_ready, ListQuery, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const OPERATOR_SELECT_SQL: &str = "SELECT id, name, is_active, max_active_leads FROM operators";
const SOURCE_SELECT_SQL: &str = "SELECT id, name, description FROM sources";
const WEIGHT_SELECT_SQL: &str =
    "SELECT id, operator_id, source_id, weight FROM operator_source_weights";

/// Repository interface for roster administration and eligibility lookup.
pub trait RosterRepository {
    fn create_operator(&self, operator: &NewOperator) -> RepoResult<Operator>;
    fn get_operator(&self, id: OperatorId) -> RepoResult<Option<Operator>>;
    fn list_operators(&self, query: &ListQuery) -> RepoResult<Vec<Operator>>;
    fn create_source(&self, source: &NewSource) -> RepoResult<Source>;
    fn get_source(&self, id: SourceId) -> RepoResult<Option<Source>>;
    fn list_sources(&self, query: &ListQuery) -> RepoResult<Vec<Source>>;
    fn create_weight(&self, link: &NewOperatorSourceWeight) -> RepoResult<OperatorSourceWeight>;
    fn list_weights(&self, query: &ListQuery) -> RepoResult<Vec<OperatorSourceWeight>>;
    /// Weight rows for `source_id` joined with their active operators.
    fn eligible_weights(&self, source_id: SourceId) -> RepoResult<Vec<EligibleWeight>>;
}

/// SQLite-backed roster repository.
pub struct SqliteRosterRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRosterRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn, &["operators", "sources", "operator_source_weights"])?;
        Ok(Self { conn })
    }
}

impl RosterRepository for SqliteRosterRepository<'_> {
    fn create_operator(&self, operator: &NewOperator) -> RepoResult<Operator> {
        self.conn.execute(
            "INSERT INTO operators (name, is_active, max_active_leads) VALUES (?1, ?2, ?3);",
            params![
                operator.name.as_str(),
                i64::from(operator.is_active),
                i64::from(operator.max_active_leads),
            ],
        )?;

        Ok(Operator {
            id: self.conn.last_insert_rowid(),
            name: operator.name.clone(),
            is_active: operator.is_active,
            max_active_leads: operator.max_active_leads,
        })
    }

    fn get_operator(&self, id: OperatorId) -> RepoResult<Option<Operator>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{OPERATOR_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_operator_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_operators(&self, query: &ListQuery) -> RepoResult<Vec<Operator>> {
        let mut stmt = self.conn.prepare(&format!(
            "{OPERATOR_SELECT_SQL} ORDER BY id ASC LIMIT ?1 OFFSET ?2;"
        ))?;
        let mut rows = stmt.query(params![
            i64::from(query.applied_limit()),
            i64::from(query.offset)
        ])?;
        let mut operators = Vec::new();
        while let Some(row) = rows.next()? {
            operators.push(parse_operator_row(row)?);
        }
        Ok(operators)
    }

    fn create_source(&self, source: &NewSource) -> RepoResult<Source> {
        self.conn.execute(
            "INSERT INTO sources (name, description) VALUES (?1, ?2);",
            params![source.name.as_str(), source.description.as_deref()],
        )?;

        Ok(Source {
            id: self.conn.last_insert_rowid(),
            name: source.name.clone(),
            description: source.description.clone(),
        })
    }

    fn get_source(&self, id: SourceId) -> RepoResult<Option<Source>> {
        let source = self
            .conn
            .query_row(
                &format!("{SOURCE_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_source_row,
            )
            .optional()?;
        Ok(source)
    }

    fn list_sources(&self, query: &ListQuery) -> RepoResult<Vec<Source>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SOURCE_SELECT_SQL} ORDER BY id ASC LIMIT ?1 OFFSET ?2;"
        ))?;
        let sources = stmt
            .query_map(
                params![i64::from(query.applied_limit()), i64::from(query.offset)],
                parse_source_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sources)
    }

    fn create_weight(&self, link: &NewOperatorSourceWeight) -> RepoResult<OperatorSourceWeight> {
        self.conn.execute(
            "INSERT INTO operator_source_weights (operator_id, source_id, weight)
             VALUES (?1, ?2, ?3);",
            params![link.operator_id, link.source_id, i64::from(link.weight)],
        )?;

        Ok(OperatorSourceWeight {
            id: self.conn.last_insert_rowid(),
            operator_id: link.operator_id,
            source_id: link.source_id,
            weight: link.weight,
        })
    }

    fn list_weights(&self, query: &ListQuery) -> RepoResult<Vec<OperatorSourceWeight>> {
        let mut stmt = self.conn.prepare(&format!(
            "{WEIGHT_SELECT_SQL} ORDER BY id ASC LIMIT ?1 OFFSET ?2;"
        ))?;
        let mut rows = stmt.query(params![
            i64::from(query.applied_limit()),
            i64::from(query.offset)
        ])?;
        let mut weights = Vec::new();
        while let Some(row) = rows.next()? {
            weights.push(OperatorSourceWeight {
                id: row.get("id")?,
                operator_id: row.get("operator_id")?,
                source_id: row.get("source_id")?,
                weight: column_u32(row.get("weight")?, "operator_source_weights.weight")?,
            });
        }
        Ok(weights)
    }

    fn eligible_weights(&self, source_id: SourceId) -> RepoResult<Vec<EligibleWeight>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                w.id AS weight_id,
                w.operator_id AS operator_id,
                w.weight AS weight,
                o.max_active_leads AS max_active_leads
             FROM operator_source_weights w
             INNER JOIN operators o ON o.id = w.operator_id
             WHERE w.source_id = ?1
               AND o.is_active = 1
             ORDER BY w.operator_id ASC, w.id ASC;",
        )?;
        let mut rows = stmt.query([source_id])?;
        let mut eligible = Vec::new();
        while let Some(row) = rows.next()? {
            eligible.push(EligibleWeight {
                weight_id: row.get("weight_id")?,
                operator_id: row.get("operator_id")?,
                weight: column_u32(row.get("weight")?, "operator_source_weights.weight")?,
                max_active_leads: column_u32(
                    row.get("max_active_leads")?,
                    "operators.max_active_leads",
                )?,
            });
        }
        Ok(eligible)
    }
}

fn parse_operator_row(row: &Row<'_>) -> RepoResult<Operator> {
    Ok(Operator {
        id: row.get("id")?,
        name: row.get("name")?,
        is_active: column_bool(row.get("is_active")?, "operators.is_active")?,
        max_active_leads: column_u32(row.get("max_active_leads")?, "operators.max_active_leads")?,
    })
}

fn parse_source_row(row: &Row<'_>) -> rusqlite::Result<Source> {
    Ok(Source {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
    })
}
