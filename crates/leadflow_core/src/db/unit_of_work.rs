//! Explicit unit of work over one SQLite write transaction.
//!
//! # Responsibility
//! - Own the transactional boundary of contact creation (begin/commit/rollback).
//! - Hold contacts staged in this unit of work that are not yet inserted.
//!
//! # Invariants
//! - The transaction starts with `BEGIN IMMEDIATE`, so the write lock is held
//!   from the first read of operator load until commit.
//! - A staged contact is either in `pending_contacts` or inserted through the
//!   transaction, never both.
//! - Dropping a unit of work without `commit` rolls everything back.

use crate::model::contact::{Contact, NewContact};
use crate::repo::contact_repo::{ContactRepository, SqliteContactRepository};
use crate::repo::RepoResult;
use log::debug;
use rusqlite::{Connection, Transaction, TransactionBehavior};

use super::DbResult;

/// One atomic unit of work.
pub struct UnitOfWork<'conn> {
    tx: Transaction<'conn>,
    pending_contacts: Vec<NewContact>,
}

impl<'conn> UnitOfWork<'conn> {
    /// Begins a write transaction on `conn`.
    ///
    /// # Errors
    /// - Returns `SQLITE_BUSY` wrapped in `DbError` when another writer keeps
    ///   the lock past the connection busy timeout.
    pub fn begin(conn: &'conn mut Connection) -> DbResult<Self> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        debug!("event=uow_begin module=db status=ok");
        Ok(Self {
            tx,
            pending_contacts: Vec::new(),
        })
    }

    /// Connection view bound to this transaction, for constructing repositories.
    pub fn connection(&self) -> &Connection {
        &self.tx
    }

    /// Queues a contact for insertion at the next `flush` or `commit`.
    pub fn stage_contact(&mut self, contact: NewContact) {
        self.pending_contacts.push(contact);
    }

    /// Contacts staged but not yet inserted, in staging order.
    pub fn pending_contacts(&self) -> &[NewContact] {
        &self.pending_contacts
    }

    /// Inserts all staged contacts in staging order and returns them.
    ///
    /// On failure, contacts not yet inserted stay staged.
    pub fn flush(&mut self) -> RepoResult<Vec<Contact>> {
        if self.pending_contacts.is_empty() {
            return Ok(Vec::new());
        }

        let repo = SqliteContactRepository::try_new(&self.tx)?;
        let pending = std::mem::take(&mut self.pending_contacts);
        let mut flushed = Vec::with_capacity(pending.len());
        let mut remaining = pending.into_iter();
        while let Some(contact) = remaining.next() {
            match repo.insert_contact(&contact) {
                Ok(inserted) => flushed.push(inserted),
                Err(err) => {
                    self.pending_contacts.push(contact);
                    self.pending_contacts.extend(remaining);
                    return Err(err);
                }
            }
        }

        debug!(
            "event=uow_flush module=db status=ok contacts={}",
            flushed.len()
        );
        Ok(flushed)
    }

    /// Flushes staged contacts and commits. Returns the contacts flushed here.
    pub fn commit(mut self) -> RepoResult<Vec<Contact>> {
        let flushed = self.flush()?;
        self.tx.commit()?;
        debug!("event=uow_commit module=db status=ok");
        Ok(flushed)
    }

    /// Discards every write and staged contact of this unit of work.
    pub fn rollback(self) -> DbResult<()> {
        let discarded = self.pending_contacts.len();
        self.tx.rollback()?;
        debug!("event=uow_rollback module=db status=ok discarded_pending={discarded}");
        Ok(())
    }
}
