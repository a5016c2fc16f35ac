//! Domain model for lead distribution.
//!
//! # Responsibility
//! - Define plain records shared by repositories, the distribution engine and
//!   services.
//! - Keep input validation next to the input types.
//!
//! # Invariants
//! - Records carry storage row ids; relationships are ids, never nested
//!   objects.

pub mod contact;
pub mod lead;
pub mod roster;
