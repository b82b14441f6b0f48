//! Content type record.
//!
//! # Invariants
//! - At most one record exists per distinct `title`.
//! - `uuid` never changes once persisted; pages and holders refer to it.

use super::ModelValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ContentTypeId = Uuid;

/// Named content category, e.g. `Blog` or `Event`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentType {
    pub uuid: ContentTypeId,
    pub title: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl ContentType {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            title: title.into(),
            created_at: super::now_epoch_ms(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.title.trim().is_empty() {
            return Err(ModelValidationError::BlankTitle("content type"));
        }
        Ok(())
    }
}
