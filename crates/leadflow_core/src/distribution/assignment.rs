//! Capacity-aware weighted operator assignment.
//!
//! # Responsibility
//! - Score eligible operators by `weight * available_capacity`.
//! - Pick one operator by a cumulative-weight walk over one uniform draw.
//!
//! # Invariants
//! - Candidates with zero effective weight are never selected.
//! - Candidates are walked in ascending operator id order, so a given draw
//!   always selects the same operator for the same candidate set.
//! - "No operator available" is an outcome, not an error.

use crate::db::UnitOfWork;
use crate::distribution::load::ActiveLoad;
use crate::model::roster::{EligibleWeight, OperatorId, SourceId};
use crate::repo::roster_repo::{RosterRepository, SqliteRosterRepository};
use crate::repo::RepoResult;
use log::debug;
use rand::Rng;

/// Eligible operator with remaining capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightedCandidate {
    pub operator_id: OperatorId,
    pub weight: u32,
    pub available_capacity: u32,
    /// `weight * available_capacity`; always `> 0` for scored candidates.
    pub effective_weight: u64,
}

/// Why no operator was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOperatorReason {
    /// No active operator is linked to the source.
    NoEligibleOperators,
    /// Every linked active operator is at or over capacity.
    AllAtCapacity,
}

impl NoOperatorReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoEligibleOperators => "no_eligible_operators",
            Self::AllAtCapacity => "all_at_capacity",
        }
    }
}

/// Result of one assignment decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    Assigned(OperatorId),
    Unassigned(NoOperatorReason),
}

impl Assignment {
    pub fn operator_id(&self) -> Option<OperatorId> {
        match self {
            Self::Assigned(operator_id) => Some(*operator_id),
            Self::Unassigned(_) => None,
        }
    }
}

/// Scores eligible weight rows against current load.
///
/// Rows without remaining capacity are dropped. The result is sorted by
/// operator id; rows of the same operator keep their input order.
pub fn score_candidates(eligible: &[EligibleWeight], load: &ActiveLoad) -> Vec<WeightedCandidate> {
    let mut candidates: Vec<WeightedCandidate> = eligible
        .iter()
        .filter_map(|row| {
            let active_count = load.active_count(row.operator_id);
            let available_capacity = row.max_active_leads.saturating_sub(active_count);
            let effective_weight = u64::from(row.weight) * u64::from(available_capacity);
            (effective_weight > 0).then_some(WeightedCandidate {
                operator_id: row.operator_id,
                weight: row.weight,
                available_capacity,
                effective_weight,
            })
        })
        .collect();
    candidates.sort_by_key(|candidate| candidate.operator_id);
    candidates
}

/// Sum of effective weights.
pub fn total_effective_weight(candidates: &[WeightedCandidate]) -> u64 {
    candidates
        .iter()
        .fold(0u64, |total, candidate| total.saturating_add(candidate.effective_weight))
}

/// Walks `candidates` accumulating effective weight and returns the first
/// whose cumulative weight exceeds `draw`.
///
/// Returns `None` when `draw` is not below the total effective weight.
pub fn pick_by_draw(candidates: &[WeightedCandidate], draw: u64) -> Option<OperatorId> {
    let mut cumulative = 0u64;
    for candidate in candidates {
        cumulative = cumulative.saturating_add(candidate.effective_weight);
        if cumulative > draw {
            return Some(candidate.operator_id);
        }
    }
    None
}

/// Draws once from `rng` in `[0, total)` and picks by cumulative weight.
pub fn select_weighted<R>(candidates: &[WeightedCandidate], rng: &mut R) -> Option<OperatorId>
where
    R: Rng + ?Sized,
{
    let total = total_effective_weight(candidates);
    if total == 0 {
        return None;
    }
    pick_by_draw(candidates, rng.gen_range(0..total))
}

/// Decides an assignment from already-fetched eligibility and load.
pub fn assign_from<R>(eligible: &[EligibleWeight], load: &ActiveLoad, rng: &mut R) -> Assignment
where
    R: Rng + ?Sized,
{
    if eligible.is_empty() {
        return Assignment::Unassigned(NoOperatorReason::NoEligibleOperators);
    }

    let candidates = score_candidates(eligible, load);
    match select_weighted(&candidates, rng) {
        Some(operator_id) => Assignment::Assigned(operator_id),
        None => Assignment::Unassigned(NoOperatorReason::AllAtCapacity),
    }
}

/// Selects an operator for a new contact from `source_id` inside `uow`.
///
/// Load is measured fresh for exactly the eligible operator set, including
/// contacts staged earlier in the same unit of work.
pub fn assign_operator<R>(
    uow: &UnitOfWork<'_>,
    source_id: SourceId,
    rng: &mut R,
) -> RepoResult<Assignment>
where
    R: Rng + ?Sized,
{
    let roster = SqliteRosterRepository::try_new(uow.connection())?;
    let eligible = roster.eligible_weights(source_id)?;

    let mut operator_ids: Vec<OperatorId> = eligible.iter().map(|row| row.operator_id).collect();
    operator_ids.dedup();
    let load = if operator_ids.is_empty() {
        ActiveLoad::default()
    } else {
        ActiveLoad::in_unit_of_work(uow, &operator_ids)?
    };

    let assignment = assign_from(&eligible, &load, rng);
    match assignment {
        Assignment::Assigned(operator_id) => debug!(
            "event=operator_assign module=distribution status=ok source_id={} candidates={} operator_id={}",
            source_id,
            operator_ids.len(),
            operator_id
        ),
        Assignment::Unassigned(reason) => debug!(
            "event=operator_assign module=distribution status=unassigned source_id={} candidates={} reason={}",
            source_id,
            operator_ids.len(),
            reason.as_str()
        ),
    }
    Ok(assignment)
}
