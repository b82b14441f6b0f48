//! Stable-name attribute lookup.
//!
//! Rendering code asks for attributes by the name they were created with.
//! Editors may rename an instance's display title at any time, so matching
//! always goes through the template's title instead.

use crate::model::attribute::{Attribute, AttributeKind, ResolvedAttribute};
use crate::model::page::PageId;
use crate::repo::attribute_repo::AttributeRepository;
use crate::repo::{RepoError, RepoResult};

pub struct AttributeLookup<'a, A: AttributeRepository> {
    repo: &'a A,
}

impl<'a, A: AttributeRepository> AttributeLookup<'a, A> {
    pub fn new(repo: &'a A) -> Self {
        Self { repo }
    }

    /// Returns the first attribute of `page` whose original title is `title`.
    ///
    /// A miss is `Ok(None)`.
    pub fn find_by_original_title(
        &self,
        page: PageId,
        title: &str,
    ) -> RepoResult<Option<Attribute>> {
        Ok(self
            .repo
            .list_resolved_for_page(page)?
            .into_iter()
            .find(|resolved| resolved.original_title == title)
            .map(|resolved| resolved.attribute))
    }

    /// Original title of one attribute: its own title for a template, the
    /// template's title for an instance.
    pub fn original_title(&self, attribute: &Attribute) -> RepoResult<String> {
        match attribute.kind {
            AttributeKind::Template => Ok(attribute.title.clone()),
            AttributeKind::Instance { template } => self
                .repo
                .get_attribute(template)?
                .map(|template| template.title)
                .ok_or(RepoError::NotFound(template)),
        }
    }

    /// All attributes of `page` with their original titles, in page order.
    pub fn resolved_attributes(&self, page: PageId) -> RepoResult<Vec<ResolvedAttribute>> {
        self.repo.list_resolved_for_page(page)
    }
}
