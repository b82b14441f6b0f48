//! Attribute linking for newly typed pages.
//!
//! # Responsibility
//! - Give a page its attribute set the first time it is bound to a type.
//! - Fan out instances of existing type templates, or seed the templates
//!   from the defaults registry when the type has none yet.
//!
//! # Invariants
//! - A page that already owns attributes is never touched.
//! - Only the first page of a type owns templates; later pages get instances.
//! - Type trees are independent: templates are never shared across types.
//! - Atomicity is the caller's concern; the linker issues individual writes.

use crate::defaults::registry::DefaultsRegistry;
use crate::model::attribute::Attribute;
use crate::model::content_type::ContentType;
use crate::model::page::PageId;
use crate::repo::attribute_repo::AttributeRepository;
use crate::repo::RepoResult;
use log::{debug, info};

/// What `ensure_attributes` did to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Page already had `existing` attributes; nothing was written.
    AlreadyLinked { existing: u32 },
    /// `created` instances linked to the type's templates.
    Linked { created: usize },
    /// Page became the template owner with `created` templates.
    Seeded { created: usize },
    /// Type has neither templates nor defaults.
    NoDefaults,
}

impl LinkOutcome {
    pub fn created(&self) -> usize {
        match self {
            Self::Linked { created } | Self::Seeded { created } => *created,
            Self::AlreadyLinked { .. } | Self::NoDefaults => 0,
        }
    }
}

/// Links pages to their type's attribute templates.
pub struct AttributeLinker<'a, A: AttributeRepository> {
    repo: &'a A,
    defaults: &'a DefaultsRegistry,
}

impl<'a, A: AttributeRepository> AttributeLinker<'a, A> {
    pub fn new(repo: &'a A, defaults: &'a DefaultsRegistry) -> Self {
        Self { repo, defaults }
    }

    /// Ensures `page` carries the attribute set of `content_type`.
    ///
    /// The page row must already exist and be bound to `content_type`, so
    /// that it is visible to the template query of later pages.
    pub fn ensure_attributes(
        &self,
        page: PageId,
        content_type: &ContentType,
    ) -> RepoResult<LinkOutcome> {
        let existing = self.repo.count_for_page(page)?;
        if existing > 0 {
            debug!(
                "event=attributes_link module=linker status=skip page_uuid={page} existing={existing}"
            );
            return Ok(LinkOutcome::AlreadyLinked { existing });
        }

        let templates = self.repo.list_templates_for_type(content_type.uuid)?;
        let outcome = if templates.is_empty() {
            self.seed_templates(page, content_type)?
        } else {
            for template in &templates {
                self.repo
                    .create_attribute(&Attribute::new_instance(page, template))?;
            }
            LinkOutcome::Linked {
                created: templates.len(),
            }
        };

        info!(
            "event=attributes_link module=linker status=ok page_uuid={page} type_uuid={} outcome={:?}",
            content_type.uuid, outcome
        );
        Ok(outcome)
    }

    fn seed_templates(&self, page: PageId, content_type: &ContentType) -> RepoResult<LinkOutcome> {
        let names = self.defaults.effective_defaults(&content_type.title);
        if names.is_empty() {
            return Ok(LinkOutcome::NoDefaults);
        }

        for (index, name) in names.iter().enumerate() {
            self.repo
                .create_attribute(&Attribute::new_template(page, name.as_str(), index as i64))?;
        }
        Ok(LinkOutcome::Seeded {
            created: names.len(),
        })
    }
}
