//! Active load accounting.
//!
//! An operator's active load is the number of its contacts in an active
//! status, counting both rows visible to the current transaction and contacts
//! staged in the unit of work but not yet inserted. It is recomputed for every
//! assignment decision and never cached across calls.

use crate::db::UnitOfWork;
use crate::model::contact::NewContact;
use crate::model::roster::OperatorId;
use crate::repo::contact_repo::{ContactRepository, SqliteContactRepository};
use crate::repo::RepoResult;
use std::collections::{BTreeMap, BTreeSet};

/// Active contact counts for a fixed operator set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveLoad {
    counts: BTreeMap<OperatorId, u32>,
}

impl ActiveLoad {
    /// Combines persisted counts with staged contacts for `operator_ids`.
    ///
    /// Entries of `persisted` and `pending` outside `operator_ids` are ignored.
    pub fn combine(
        persisted: &BTreeMap<OperatorId, u32>,
        pending: &[NewContact],
        operator_ids: &[OperatorId],
    ) -> Self {
        let wanted: BTreeSet<OperatorId> = operator_ids.iter().copied().collect();
        let mut counts: BTreeMap<OperatorId, u32> = persisted
            .iter()
            .filter(|(id, _)| wanted.contains(*id))
            .map(|(id, count)| (*id, *count))
            .collect();

        for operator_id in pending.iter().filter_map(NewContact::active_operator) {
            if wanted.contains(&operator_id) {
                *counts.entry(operator_id).or_insert(0) += 1;
            }
        }

        Self { counts }
    }

    /// Measures load for `operator_ids` with one batched count query.
    pub fn measure<R>(
        repo: &R,
        pending: &[NewContact],
        operator_ids: &[OperatorId],
    ) -> RepoResult<Self>
    where
        R: ContactRepository + ?Sized,
    {
        let persisted = repo.count_active_by_operator(operator_ids)?;
        Ok(Self::combine(&persisted, pending, operator_ids))
    }

    /// Measures load inside `uow`, including its staged contacts.
    pub fn in_unit_of_work(uow: &UnitOfWork<'_>, operator_ids: &[OperatorId]) -> RepoResult<Self> {
        let repo = SqliteContactRepository::try_new(uow.connection())?;
        Self::measure(&repo, uow.pending_contacts(), operator_ids)
    }

    /// Active count for one operator; zero when unknown.
    pub fn active_count(&self, operator_id: OperatorId) -> u32 {
        self.counts.get(&operator_id).copied().unwrap_or(0)
    }
}

/// Active contact count of a single operator inside `uow`.
pub fn active_count_for_operator(uow: &UnitOfWork<'_>, operator_id: OperatorId) -> RepoResult<u32> {
    ActiveLoad::in_unit_of_work(uow, &[operator_id]).map(|load| load.active_count(operator_id))
}

#[cfg(test)]
mod tests {
    use super::ActiveLoad;
    use crate::model::contact::{ContactStatus, NewContact};
    use std::collections::BTreeMap;

    #[test]
    fn combine_adds_active_pending_contacts() {
        let persisted = BTreeMap::from([(1, 2), (2, 1)]);
        let mut completed = NewContact::new(10, 1, Some(2), None);
        completed.status = ContactStatus::Completed;
        let pending = vec![
            NewContact::new(10, 1, Some(1), None),
            NewContact::new(11, 1, Some(2), None),
            completed,
            NewContact::new(12, 1, None, None),
        ];

        let load = ActiveLoad::combine(&persisted, &pending, &[1, 2, 3]);
        assert_eq!(load.active_count(1), 3);
        assert_eq!(load.active_count(2), 2);
        assert_eq!(load.active_count(3), 0);
    }

    #[test]
    fn combine_ignores_operators_outside_candidate_set() {
        let persisted = BTreeMap::from([(5, 4)]);
        let pending = vec![NewContact::new(1, 1, Some(6), None)];

        let load = ActiveLoad::combine(&persisted, &pending, &[7]);
        assert_eq!(load.active_count(5), 0);
        assert_eq!(load.active_count(6), 0);
        assert_eq!(load.active_count(7), 0);
    }
}
