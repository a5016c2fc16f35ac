//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and distribution calls into use-case level APIs.
//! - Keep callers decoupled from storage details.

pub mod contact_service;
pub mod roster_service;
