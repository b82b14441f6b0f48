//! Core use-case services.
//!
//! # Responsibility
//! - Link pages to their type's attribute templates.
//! - Resolve attributes by their stable original title.
//! - Orchestrate page saves over the repository layer.

pub mod linker;
pub mod lookup;
pub mod page_service;
