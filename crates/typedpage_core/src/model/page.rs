//! Content page and holder records.
//!
//! # Responsibility
//! - Describe the page aggregate that owns attribute instances.
//! - Describe the holder container a page inherits its type from.
//!
//! # Invariants
//! - A page belongs to at most one holder and at most one content type.
//! - After a successful save, `date` is always set.

use super::content_type::ContentTypeId;
use super::ModelValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type PageId = Uuid;
pub type HolderId = Uuid;

/// Renderer fallback used after the type-specific view.
pub const PAGE_VIEW_NAME: &str = "ContentPage";
/// Last-resort renderer view.
pub const BASE_VIEW_NAME: &str = "Page";

/// Container bound to one content type; parent of typed pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holder {
    pub uuid: HolderId,
    pub title: String,
    /// `None` until the holder is bound, either explicitly or by adopting an
    /// existing type when its first child page is saved.
    pub type_uuid: Option<ContentTypeId>,
}

impl Holder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            title: title.into(),
            type_uuid: None,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.title.trim().is_empty() {
            return Err(ModelValidationError::BlankTitle("holder"));
        }
        Ok(())
    }
}

/// Typed content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPage {
    pub uuid: PageId,
    pub holder_uuid: Option<HolderId>,
    /// Inherited from the holder on save; never set directly by editors.
    pub type_uuid: Option<ContentTypeId>,
    pub title: String,
    pub content: String,
    /// Short abstract shown in listings.
    pub summary: String,
    /// Optional redirect to the original source.
    pub external_link: Option<String>,
    /// Unix epoch milliseconds. Defaults to save time when unset.
    pub date: Option<i64>,
}

impl ContentPage {
    /// Creates an unsaved, untyped page.
    pub fn new(holder_uuid: Option<HolderId>, title: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            holder_uuid,
            type_uuid: None,
            title: title.into(),
            content: String::new(),
            summary: String::new(),
            external_link: None,
            date: None,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.title.trim().is_empty() {
            return Err(ModelValidationError::BlankTitle("page"));
        }
        Ok(())
    }
}

/// Normalizes an editor-supplied external link.
///
/// Blank input clears the link; input without an `http` prefix gets
/// `http://` prepended. Reachability is not checked here.
pub fn normalize_external_link(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.to_ascii_lowercase().starts_with("http") {
        Some(trimmed.to_string())
    } else {
        Some(format!("http://{trimmed}"))
    }
}

/// Returns renderer view names in lookup order for a page of `type_title`.
///
/// `Some("Press Release")` yields
/// `["ContentPage_PressRelease", "ContentPage", "Page"]`.
pub fn view_template_candidates(type_title: Option<&str>) -> Vec<String> {
    let mut candidates = Vec::with_capacity(3);
    if let Some(title) = type_title {
        let compact: String = title.chars().filter(|c| *c != ' ').collect();
        if !compact.is_empty() {
            candidates.push(format!("{PAGE_VIEW_NAME}_{compact}"));
        }
    }
    candidates.push(PAGE_VIEW_NAME.to_string());
    candidates.push(BASE_VIEW_NAME.to_string());
    candidates
}
