//! Page write-time orchestration.
//!
//! # Responsibility
//! - Run the page-save hook: default date, link normalization, attribute
//!   edits, holder/type binding and attribute linking.
//! - Own the defaults registry and create type records for its entries.
//! - Expose stable-name lookups to rendering code.
//!
//! # Invariants
//! - Every save runs in one `IMMEDIATE` transaction; a failed save persists
//!   nothing and leaves the caller's page value unchanged.
//! - A page without a holder is saved untyped and without attributes.
//! - A holder without a type adopts the oldest existing type, persisted as
//!   part of the same save. With no type stored yet, the registry's first
//!   type is created and adopted instead.

use crate::defaults::registry::DefaultsRegistry;
use crate::model::attribute::{Attribute, AttributeId, ResolvedAttribute};
use crate::model::content_type::ContentType;
use crate::model::now_epoch_ms;
use crate::model::page::{
    normalize_external_link, view_template_candidates, ContentPage, Holder, HolderId, PageId,
};
use crate::repo::attribute_repo::{AttributeRepository, SqliteAttributeRepository};
use crate::repo::page_repo::{PageRepository, SqlitePageRepository};
use crate::repo::type_repo::{SqliteTypeRegistry, TypeRegistry};
use crate::repo::RepoError;
use crate::service::linker::{AttributeLinker, LinkOutcome};
use crate::service::lookup::AttributeLookup;
use log::{error, info};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors from page service operations.
#[derive(Debug)]
pub enum ServiceError {
    HolderNotFound(HolderId),
    AttributeNotFound(AttributeId),
    /// Edit targets an attribute owned by another page.
    AttributeNotOnPage {
        attribute: AttributeId,
        page: PageId,
    },
    /// A holder needs a type, none exists and the registry knows none.
    NoContentTypes,
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HolderNotFound(id) => write!(f, "holder not found: {id}"),
            Self::AttributeNotFound(id) => write!(f, "attribute not found: {id}"),
            Self::AttributeNotOnPage { attribute, page } => {
                write!(f, "attribute {attribute} does not belong to page {page}")
            }
            Self::NoContentTypes => write!(f, "no content type is registered"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

/// Editor-submitted value for one attribute of the saved page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeEdit {
    pub attribute: AttributeId,
    pub content: String,
}

/// Result of one page save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Type the page is bound to; `None` for pages without a holder.
    pub content_type: Option<ContentType>,
    /// `true` when the holder had no type and adopted one during this save.
    pub holder_adopted_type: bool,
    /// Linking result; `None` when linking was skipped.
    pub link: Option<LinkOutcome>,
}

/// Page service facade over a migrated SQLite connection.
pub struct PageService<'conn> {
    conn: &'conn Connection,
    defaults: DefaultsRegistry,
}

impl<'conn> PageService<'conn> {
    /// Creates a service owning `defaults`.
    ///
    /// Call [`PageService::bootstrap`] once at startup so every default type
    /// has a durable record before the first save.
    pub fn try_new(conn: &'conn Connection, defaults: DefaultsRegistry) -> ServiceResult<Self> {
        SqliteAttributeRepository::try_new(conn)?;
        SqlitePageRepository::try_new(conn)?;
        SqliteTypeRegistry::try_new(conn)?;
        Ok(Self { conn, defaults })
    }

    pub fn defaults(&self) -> &DefaultsRegistry {
        &self.defaults
    }

    /// Creates type records for every type known to the registry.
    pub fn bootstrap(&self) -> ServiceResult<Vec<ContentType>> {
        let names = self.defaults.type_names();
        self.create_types(&names)
    }

    /// Merges a registration mapping and eagerly creates the new types.
    ///
    /// Malformed input is ignored and yields an empty list.
    pub fn register_defaults(&mut self, input: &Value) -> ServiceResult<Vec<ContentType>> {
        let accepted = self.defaults.register_value(input);
        self.create_types(&accepted)
    }

    /// Creates a holder, optionally bound to the type titled `type_title`.
    pub fn create_holder(
        &self,
        title: impl Into<String>,
        type_title: Option<&str>,
    ) -> ServiceResult<Holder> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut holder = Holder::new(title);
        if let Some(type_title) = type_title {
            let types = SqliteTypeRegistry::try_new(&tx)?;
            holder.type_uuid = Some(types.resolve_or_create(type_title)?.uuid);
        }
        SqlitePageRepository::try_new(&tx)?.create_holder(&holder)?;
        tx.commit()?;
        Ok(holder)
    }

    pub fn get_holder(&self, id: HolderId) -> ServiceResult<Option<Holder>> {
        Ok(SqlitePageRepository::try_new(self.conn)?.get_holder(id)?)
    }

    pub fn get_page(&self, id: PageId) -> ServiceResult<Option<ContentPage>> {
        Ok(SqlitePageRepository::try_new(self.conn)?.get_page(id)?)
    }

    /// Pages under one holder, oldest first.
    pub fn holder_pages(&self, holder: HolderId) -> ServiceResult<Vec<ContentPage>> {
        let pages = SqlitePageRepository::try_new(self.conn)?;
        if pages.get_holder(holder)?.is_none() {
            return Err(ServiceError::HolderNotFound(holder));
        }
        Ok(pages.list_holder_pages(holder)?)
    }

    /// Saves `page`, running the write-time hook.
    ///
    /// On success `page` reflects what was persisted (date, normalized link,
    /// inherited type). On failure nothing is persisted and `page` is left
    /// as it was.
    pub fn save_page(
        &self,
        page: &mut ContentPage,
        edits: &[AttributeEdit],
    ) -> ServiceResult<SaveOutcome> {
        let started_at = Instant::now();
        let mut staged = page.clone();

        let result = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(ServiceError::from)
            .and_then(|tx| {
                let outcome = self.save_page_in(&tx, &mut staged, edits)?;
                tx.commit()?;
                Ok(outcome)
            });

        match result {
            Ok(outcome) => {
                info!(
                    "event=page_save module=service status=ok page_uuid={} typed={} adopted={} created={} duration_ms={}",
                    staged.uuid,
                    outcome.content_type.is_some(),
                    outcome.holder_adopted_type,
                    outcome.link.map_or(0, |link| link.created()),
                    started_at.elapsed().as_millis()
                );
                *page = staged;
                Ok(outcome)
            }
            Err(err) => {
                error!(
                    "event=page_save module=service status=error page_uuid={} duration_ms={} error={}",
                    page.uuid,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Renames the display title of one attribute.
    ///
    /// Stable-name lookups are unaffected.
    pub fn rename_attribute(
        &self,
        id: AttributeId,
        title: impl Into<String>,
    ) -> ServiceResult<Attribute> {
        let repo = SqliteAttributeRepository::try_new(self.conn)?;
        let mut attribute = repo
            .get_attribute(id)?
            .ok_or(ServiceError::AttributeNotFound(id))?;
        attribute.title = title.into().trim().to_string();
        repo.update_attribute(&attribute)?;
        Ok(attribute)
    }

    /// Replaces the content value of one attribute.
    pub fn set_attribute_content(
        &self,
        id: AttributeId,
        content: impl Into<String>,
    ) -> ServiceResult<Attribute> {
        let repo = SqliteAttributeRepository::try_new(self.conn)?;
        let mut attribute = repo
            .get_attribute(id)?
            .ok_or(ServiceError::AttributeNotFound(id))?;
        attribute.content = content.into();
        repo.update_attribute(&attribute)?;
        Ok(attribute)
    }

    /// Finds an attribute of `page` by its original title.
    pub fn find_attribute(
        &self,
        page: PageId,
        original_title: &str,
    ) -> ServiceResult<Option<Attribute>> {
        let repo = SqliteAttributeRepository::try_new(self.conn)?;
        Ok(AttributeLookup::new(&repo).find_by_original_title(page, original_title)?)
    }

    /// All attributes of `page` with their original titles.
    pub fn page_attributes(&self, page: PageId) -> ServiceResult<Vec<ResolvedAttribute>> {
        let repo = SqliteAttributeRepository::try_new(self.conn)?;
        Ok(AttributeLookup::new(&repo).resolved_attributes(page)?)
    }

    /// Renderer view names for `page`, most specific first.
    pub fn view_template_candidates(&self, page: &ContentPage) -> ServiceResult<Vec<String>> {
        let type_title = match page.type_uuid {
            Some(id) => SqliteTypeRegistry::try_new(self.conn)?
                .get_type(id)?
                .map(|content_type| content_type.title),
            None => None,
        };
        Ok(view_template_candidates(type_title.as_deref()))
    }

    fn create_types(&self, names: &[String]) -> ServiceResult<Vec<ContentType>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let types = SqliteTypeRegistry::try_new(&tx)?;
        let created = names
            .iter()
            .map(|name| types.resolve_or_create(name))
            .collect::<Result<Vec<_>, _>>()?;
        tx.commit()?;
        Ok(created)
    }

    // Registry's first type, created inside the caller's transaction.
    fn first_default_type(&self, types: &SqliteTypeRegistry<'_>) -> ServiceResult<ContentType> {
        let name = self
            .defaults
            .type_names()
            .into_iter()
            .next()
            .ok_or(ServiceError::NoContentTypes)?;
        Ok(types.resolve_or_create(&name)?)
    }

    fn save_page_in(
        &self,
        conn: &Connection,
        page: &mut ContentPage,
        edits: &[AttributeEdit],
    ) -> ServiceResult<SaveOutcome> {
        let types = SqliteTypeRegistry::try_new(conn)?;
        let pages = SqlitePageRepository::try_new(conn)?;
        let attributes = SqliteAttributeRepository::try_new(conn)?;

        if page.date.is_none() {
            page.date = Some(now_epoch_ms());
        }
        page.external_link = normalize_external_link(page.external_link.as_deref());

        let mut holder_adopted_type = false;
        let content_type = match page.holder_uuid {
            None => None,
            Some(holder_id) => {
                let holder = pages
                    .get_holder(holder_id)?
                    .ok_or(ServiceError::HolderNotFound(holder_id))?;
                let bound = holder
                    .type_uuid
                    .map(|id| types.get_type(id))
                    .transpose()?
                    .flatten();
                let content_type = match bound {
                    Some(content_type) => content_type,
                    None => {
                        let adopted = match types.any_existing()? {
                            Some(existing) => existing,
                            None => self.first_default_type(&types)?,
                        };
                        pages.bind_holder_type(holder.uuid, adopted.uuid)?;
                        holder_adopted_type = true;
                        info!(
                            "event=holder_adopt_type module=service status=ok holder_uuid={} type_uuid={}",
                            holder.uuid, adopted.uuid
                        );
                        adopted
                    }
                };
                page.type_uuid = Some(content_type.uuid);
                Some(content_type)
            }
        };

        pages.save_page(page)?;

        for edit in edits {
            let mut attribute = attributes
                .get_attribute(edit.attribute)?
                .ok_or(ServiceError::AttributeNotFound(edit.attribute))?;
            if attribute.page_uuid != page.uuid {
                return Err(ServiceError::AttributeNotOnPage {
                    attribute: edit.attribute,
                    page: page.uuid,
                });
            }
            attribute.content = edit.content.clone();
            attributes.update_attribute(&attribute)?;
        }

        let link = content_type
            .as_ref()
            .map(|content_type| {
                AttributeLinker::new(&attributes, &self.defaults)
                    .ensure_attributes(page.uuid, content_type)
            })
            .transpose()?;

        Ok(SaveOutcome {
            content_type,
            holder_adopted_type,
            link,
        })
    }
}
