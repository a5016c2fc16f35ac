//! Lead distribution engine.
//!
//! # Responsibility
//! - Resolve the canonical lead of a contact event (`dedup`).
//! - Account for operator load inside a unit of work (`load`).
//! - Choose an operator by capacity-aware weighted sampling (`assignment`).
//!
//! # Invariants
//! - Every decision reads through the caller's unit of work; nothing here
//!   opens, commits or caches across transactions.

pub mod assignment;
pub mod dedup;
pub mod load;
