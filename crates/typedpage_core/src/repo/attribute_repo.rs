//! Attribute repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist template and instance attributes in one table.
//! - Answer the type-scoped template query used for linking.
//! - Resolve original titles with a single self-join.
//!
//! # Invariants
//! - `kind`/`template_uuid` columns always agree (schema CHECK).
//! - Page listings are ordered by `sort_order ASC, uuid ASC`.

use super::{parse_optional_uuid, parse_uuid, RepoError, RepoResult};
use crate::db::ensure_schema_ready;
use crate::model::attribute::{Attribute, AttributeId, AttributeKind, ResolvedAttribute};
use crate::model::content_type::ContentTypeId;
use crate::model::page::PageId;
use rusqlite::{params, Connection, OptionalExtension, Row};

const ATTRIBUTE_SELECT_SQL: &str = "SELECT
    a.uuid AS uuid,
    a.page_uuid AS page_uuid,
    a.kind AS kind,
    a.template_uuid AS template_uuid,
    a.title AS title,
    a.content AS content,
    a.sort_order AS sort_order
FROM attributes a";

const KIND_TEMPLATE: &str = "template";
const KIND_INSTANCE: &str = "instance";

/// Repository interface for attribute persistence.
pub trait AttributeRepository {
    fn create_attribute(&self, attribute: &Attribute) -> RepoResult<AttributeId>;
    /// Updates the editable fields (`title`, `content`).
    fn update_attribute(&self, attribute: &Attribute) -> RepoResult<()>;
    fn get_attribute(&self, id: AttributeId) -> RepoResult<Option<Attribute>>;
    fn count_for_page(&self, page: PageId) -> RepoResult<u32>;
    fn list_for_page(&self, page: PageId) -> RepoResult<Vec<Attribute>>;
    /// Templates owned by any page of `content_type`, in linking order.
    fn list_templates_for_type(&self, content_type: ContentTypeId) -> RepoResult<Vec<Attribute>>;
    /// Page attributes paired with their original titles.
    fn list_resolved_for_page(&self, page: PageId) -> RepoResult<Vec<ResolvedAttribute>>;
}

/// SQLite-backed attribute repository.
pub struct SqliteAttributeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAttributeRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn, &["attributes", "content_pages"])?;
        Ok(Self { conn })
    }
}

impl AttributeRepository for SqliteAttributeRepository<'_> {
    fn create_attribute(&self, attribute: &Attribute) -> RepoResult<AttributeId> {
        attribute.validate()?;
        let (kind, template_uuid) = kind_to_db(&attribute.kind);
        self.conn.execute(
            "INSERT INTO attributes (
                uuid,
                page_uuid,
                kind,
                template_uuid,
                title,
                content,
                sort_order
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                attribute.uuid.to_string(),
                attribute.page_uuid.to_string(),
                kind,
                template_uuid.map(|value| value.to_string()),
                attribute.title.as_str(),
                attribute.content.as_str(),
                attribute.sort_order,
            ],
        )?;
        Ok(attribute.uuid)
    }

    fn update_attribute(&self, attribute: &Attribute) -> RepoResult<()> {
        attribute.validate()?;
        let changed = self.conn.execute(
            "UPDATE attributes
             SET
                title = ?2,
                content = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                attribute.uuid.to_string(),
                attribute.title.as_str(),
                attribute.content.as_str(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(attribute.uuid));
        }
        Ok(())
    }

    fn get_attribute(&self, id: AttributeId) -> RepoResult<Option<Attribute>> {
        self.conn
            .query_row(
                &format!("{ATTRIBUTE_SELECT_SQL} WHERE a.uuid = ?1;"),
                [id.to_string()],
                |row| Ok(parse_attribute_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn count_for_page(&self, page: PageId) -> RepoResult<u32> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM attributes WHERE page_uuid = ?1;",
            [page.to_string()],
            |row| row.get::<_, u32>(0),
        )?;
        Ok(count)
    }

    fn list_for_page(&self, page: PageId) -> RepoResult<Vec<Attribute>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ATTRIBUTE_SELECT_SQL}
             WHERE a.page_uuid = ?1
             ORDER BY a.sort_order ASC, a.uuid ASC;"
        ))?;
        let mut rows = stmt.query([page.to_string()])?;
        let mut attributes = Vec::new();
        while let Some(row) = rows.next()? {
            attributes.push(parse_attribute_row(row)?);
        }
        Ok(attributes)
    }

    fn list_templates_for_type(&self, content_type: ContentTypeId) -> RepoResult<Vec<Attribute>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ATTRIBUTE_SELECT_SQL}
             INNER JOIN content_pages p ON p.uuid = a.page_uuid
             WHERE p.type_uuid = ?1
               AND a.kind = '{KIND_TEMPLATE}'
             ORDER BY p.created_at ASC, p.uuid ASC, a.sort_order ASC, a.uuid ASC;"
        ))?;
        let mut rows = stmt.query([content_type.to_string()])?;
        let mut templates = Vec::new();
        while let Some(row) = rows.next()? {
            templates.push(parse_attribute_row(row)?);
        }
        Ok(templates)
    }

    fn list_resolved_for_page(&self, page: PageId) -> RepoResult<Vec<ResolvedAttribute>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                a.uuid AS uuid,
                a.page_uuid AS page_uuid,
                a.kind AS kind,
                a.template_uuid AS template_uuid,
                a.title AS title,
                a.content AS content,
                a.sort_order AS sort_order,
                t.title AS template_title
             FROM attributes a
             LEFT JOIN attributes t ON t.uuid = a.template_uuid
             WHERE a.page_uuid = ?1
             ORDER BY a.sort_order ASC, a.uuid ASC;",
        )?;
        let mut rows = stmt.query([page.to_string()])?;
        let mut resolved = Vec::new();
        while let Some(row) = rows.next()? {
            let attribute = parse_attribute_row(row)?;
            let template_title: Option<String> = row.get("template_title")?;
            let original_title = match (&attribute.kind, template_title) {
                (AttributeKind::Template, _) => attribute.title.clone(),
                (AttributeKind::Instance { .. }, Some(title)) => title,
                (AttributeKind::Instance { template }, None) => {
                    return Err(RepoError::InvalidData(format!(
                        "attribute {} links to missing template {template}",
                        attribute.uuid
                    )));
                }
            };
            resolved.push(ResolvedAttribute {
                attribute,
                original_title,
            });
        }
        Ok(resolved)
    }
}

fn kind_to_db(kind: &AttributeKind) -> (&'static str, Option<AttributeId>) {
    match kind {
        AttributeKind::Template => (KIND_TEMPLATE, None),
        AttributeKind::Instance { template } => (KIND_INSTANCE, Some(*template)),
    }
}

fn parse_attribute_row(row: &Row<'_>) -> RepoResult<Attribute> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text, "attributes.uuid")?;
    let page_text: String = row.get("page_uuid")?;
    let template = parse_optional_uuid(row.get("template_uuid")?, "attributes.template_uuid")?;

    let kind_text: String = row.get("kind")?;
    let kind = match (kind_text.as_str(), template) {
        (KIND_TEMPLATE, None) => AttributeKind::Template,
        (KIND_INSTANCE, Some(template)) => AttributeKind::Instance { template },
        _ => {
            return Err(RepoError::InvalidData(format!(
                "attribute {uuid} has inconsistent kind `{kind_text}`"
            )));
        }
    };

    let attribute = Attribute {
        uuid,
        page_uuid: parse_uuid(&page_text, "attributes.page_uuid")?,
        kind,
        title: row.get("title")?,
        content: row.get("content")?,
        sort_order: row.get("sort_order")?,
    };
    attribute.validate()?;
    Ok(attribute)
}
