//! Per-type default attribute configuration.
//!
//! # Responsibility
//! - Hold built-in and registered attribute name lists per content type.
//! - Load registrations from JSON configuration files.
//!
//! # Invariants
//! - The registry is an owned value; there is no process-wide table.
//! - Registration never fails loudly on malformed input.

pub mod config;
pub mod registry;
