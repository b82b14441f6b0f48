//! Domain model for typed content pages and their custom attributes.
//!
//! # Responsibility
//! - Define the records shared by repositories and services.
//! - Keep validation rules next to the data they guard.
//!
//! # Invariants
//! - Every record is identified by a stable `Uuid`.
//! - An attribute is either a type-level template or a page-level instance
//!   linked to exactly one template; there is no third state.

pub mod attribute;
pub mod content_type;
pub mod page;

use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Validation failures raised before any record reaches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Title is empty after trimming.
    BlankTitle(&'static str),
    /// Instance attribute links to itself.
    SelfLinkedAttribute(Uuid),
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle(record) => write!(f, "{record} title must not be blank"),
            Self::SelfLinkedAttribute(id) => {
                write!(f, "attribute {id} cannot be its own template")
            }
        }
    }
}

impl Error for ModelValidationError {}

/// Current wall-clock time in epoch milliseconds.
pub(crate) fn now_epoch_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}
