//! Operator roster model: operators, sources and per-source weights.
//!
//! # Responsibility
//! - Define the administrative records that decide who may receive contacts.
//! - Validate roster input before it reaches storage.
//!
//! # Invariants
//! - An operator is eligible for a source only when a weight row links them
//!   and the operator is active.
//! - `weight` is always `>= 1`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage row id of an operator.
pub type OperatorId = i64;
/// Storage row id of a source.
pub type SourceId = i64;
/// Storage row id of an operator/source weight link.
pub type WeightId = i64;

/// Capacity given to operators created without an explicit limit.
pub const DEFAULT_MAX_ACTIVE_LEADS: u32 = 5;
/// Weight given to links created without an explicit weight.
pub const DEFAULT_WEIGHT: u32 = 1;

/// Human agent that receives contacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: OperatorId,
    pub name: String,
    pub is_active: bool,
    /// Maximum number of `new`/`in_progress` contacts held at once.
    pub max_active_leads: u32,
}

/// Operator together with its current active contact count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorLoad {
    #[serde(flatten)]
    pub operator: Operator,
    pub active_contacts: u32,
}

impl OperatorLoad {
    /// Remaining capacity, clamped at zero when an operator is over its limit.
    pub fn available_capacity(&self) -> u32 {
        self.operator
            .max_active_leads
            .saturating_sub(self.active_contacts)
    }
}

/// Input for creating an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOperator {
    pub name: String,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
    #[serde(default = "default_max_active_leads")]
    pub max_active_leads: u32,
}

impl NewOperator {
    /// Creates an active operator with the default capacity.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_active: true,
            max_active_leads: DEFAULT_MAX_ACTIVE_LEADS,
        }
    }

    pub fn with_capacity(mut self, max_active_leads: u32) -> Self {
        self.max_active_leads = max_active_leads;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn validate(&self) -> Result<(), RosterValidationError> {
        if self.name.trim().is_empty() {
            return Err(RosterValidationError::BlankName("operator"));
        }
        Ok(())
    }
}

/// Origin channel of contact events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: SourceId,
    /// Unique across sources.
    pub name: String,
    pub description: Option<String>,
}

/// Input for creating a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSource {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> Result<(), RosterValidationError> {
        if self.name.trim().is_empty() {
            return Err(RosterValidationError::BlankName("source"));
        }
        Ok(())
    }
}

/// Link making one operator eligible for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorSourceWeight {
    pub id: WeightId,
    pub operator_id: OperatorId,
    pub source_id: SourceId,
    pub weight: u32,
}

/// Input for linking an operator to a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOperatorSourceWeight {
    pub operator_id: OperatorId,
    pub source_id: SourceId,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

impl NewOperatorSourceWeight {
    pub fn new(operator_id: OperatorId, source_id: SourceId, weight: u32) -> Self {
        Self {
            operator_id,
            source_id,
            weight,
        }
    }

    pub fn validate(&self) -> Result<(), RosterValidationError> {
        if self.weight < 1 {
            return Err(RosterValidationError::NonPositiveWeight(self.weight));
        }
        Ok(())
    }
}

/// Weight row joined with its active operator, as read by the assignment engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibleWeight {
    pub weight_id: WeightId,
    pub operator_id: OperatorId,
    pub weight: u32,
    pub max_active_leads: u32,
}

/// Roster input validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterValidationError {
    /// Name is blank after trim; carries the entity kind.
    BlankName(&'static str),
    NonPositiveWeight(u32),
}

impl Display for RosterValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName(entity) => write!(f, "{entity} name must not be blank"),
            Self::NonPositiveWeight(weight) => {
                write!(f, "weight must be at least 1, got {weight}")
            }
        }
    }
}

impl Error for RosterValidationError {}

fn default_is_active() -> bool {
    true
}

fn default_max_active_leads() -> u32 {
    DEFAULT_MAX_ACTIVE_LEADS
}

fn default_weight() -> u32 {
    DEFAULT_WEIGHT
}
