//! Custom attribute record: type-level template or page-level instance.
//!
//! # Responsibility
//! - Represent both attribute roles with one record and an explicit tag.
//! - Derive editor hints from attribute titles.
//!
//! # Invariants
//! - `AttributeKind::Template` carries no link.
//! - `AttributeKind::Instance` always links to a template other than itself.
//! - The original title of an instance is its template's title, never its
//!   own (editable) `title`.

use super::page::PageId;
use super::ModelValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type AttributeId = Uuid;

static DATE_LIKE_TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)time|date|when").expect("valid date-like title regex"));

/// Role of an attribute within its content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum AttributeKind {
    /// Canonical definition, owned by the first page of its type.
    Template,
    /// Editable per-page copy of `template`.
    Instance { template: AttributeId },
}

/// Editor widget hint for an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeFieldKind {
    DateTime,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub uuid: AttributeId,
    pub page_uuid: PageId,
    #[serde(flatten)]
    pub kind: AttributeKind,
    /// Display label. Editors may rename it; lookups never match on it.
    pub title: String,
    pub content: String,
    /// Position within the owning page, copied from the template.
    pub sort_order: i64,
}

impl Attribute {
    /// Creates a template attribute owned by `page_uuid`.
    pub fn new_template(page_uuid: PageId, title: impl Into<String>, sort_order: i64) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            page_uuid,
            kind: AttributeKind::Template,
            title: title.into(),
            content: String::new(),
            sort_order,
        }
    }

    /// Creates an empty instance of `template` on `page_uuid`.
    ///
    /// Title and position are copied from the template at creation time.
    pub fn new_instance(page_uuid: PageId, template: &Attribute) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            page_uuid,
            kind: AttributeKind::Instance {
                template: template.uuid,
            },
            title: template.title.clone(),
            content: String::new(),
            sort_order: template.sort_order,
        }
    }

    pub fn is_template(&self) -> bool {
        matches!(self.kind, AttributeKind::Template)
    }

    pub fn template_id(&self) -> Option<AttributeId> {
        match self.kind {
            AttributeKind::Template => None,
            AttributeKind::Instance { template } => Some(template),
        }
    }

    pub fn field_kind(&self) -> AttributeFieldKind {
        field_kind_for_title(&self.title)
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.title.trim().is_empty() {
            return Err(ModelValidationError::BlankTitle("attribute"));
        }
        if self.template_id() == Some(self.uuid) {
            return Err(ModelValidationError::SelfLinkedAttribute(self.uuid));
        }
        Ok(())
    }
}

/// Attribute paired with its stable original title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAttribute {
    pub attribute: Attribute,
    pub original_title: String,
}

/// Titles mentioning a time, date or "when" are edited as date-times.
pub fn field_kind_for_title(title: &str) -> AttributeFieldKind {
    if DATE_LIKE_TITLE_RE.is_match(title) {
        AttributeFieldKind::DateTime
    } else {
        AttributeFieldKind::Text
    }
}
