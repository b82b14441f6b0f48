//! Core domain logic for typed content pages.
//!
//! Content types declare named custom attributes. The first page saved under
//! a type owns the type's attribute templates; every later page receives
//! editable instances linked back to them, so code can always find an
//! attribute by the name it was created with.

pub mod db;
pub mod defaults;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use defaults::config::{load_defaults_file, merge_defaults_file, ConfigError};
pub use defaults::registry::{DefaultsRegistry, HOLDER_SENTINEL};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::attribute::{
    field_kind_for_title, Attribute, AttributeFieldKind, AttributeId, AttributeKind,
    ResolvedAttribute,
};
pub use model::content_type::{ContentType, ContentTypeId};
pub use model::page::{ContentPage, Holder, HolderId, PageId};
pub use model::ModelValidationError;
pub use repo::attribute_repo::{AttributeRepository, SqliteAttributeRepository};
pub use repo::page_repo::{PageRepository, SqlitePageRepository};
pub use repo::type_repo::{SqliteTypeRegistry, TypeRegistry};
pub use repo::{RepoError, RepoResult};
pub use service::linker::{AttributeLinker, LinkOutcome};
pub use service::lookup::AttributeLookup;
pub use service::page_service::{
    AttributeEdit, PageService, SaveOutcome, ServiceError, ServiceResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
