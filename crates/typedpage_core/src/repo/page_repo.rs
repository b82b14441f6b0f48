//! Holder/page repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist holders and their type binding.
//! - Persist content pages, inserting on first save and updating afterwards.
//!
//! # Invariants
//! - `save_page` is an upsert keyed by page uuid; `created_at` is set in
//!   epoch milliseconds on insert and kept afterwards.
//! - Holder/type references are enforced by foreign keys.

use super::{parse_optional_uuid, parse_uuid, RepoError, RepoResult};
use crate::db::ensure_schema_ready;
use crate::model::content_type::ContentTypeId;
use crate::model::now_epoch_ms;
use crate::model::page::{ContentPage, Holder, HolderId, PageId};
use rusqlite::{params, Connection, OptionalExtension, Row};

const HOLDER_SELECT_SQL: &str = "SELECT uuid, title, type_uuid FROM holders";

const PAGE_SELECT_SQL: &str = "SELECT
    uuid,
    holder_uuid,
    type_uuid,
    title,
    content,
    summary,
    external_link,
    date
FROM content_pages";

/// Repository interface for holders and pages.
pub trait PageRepository {
    fn create_holder(&self, holder: &Holder) -> RepoResult<HolderId>;
    fn get_holder(&self, id: HolderId) -> RepoResult<Option<Holder>>;
    /// Persists the holder's type binding.
    fn bind_holder_type(&self, id: HolderId, type_uuid: ContentTypeId) -> RepoResult<()>;
    /// Inserts the page, or updates it when it already exists.
    fn save_page(&self, page: &ContentPage) -> RepoResult<()>;
    fn get_page(&self, id: PageId) -> RepoResult<Option<ContentPage>>;
    /// Lists pages under one holder, oldest first.
    fn list_holder_pages(&self, holder: HolderId) -> RepoResult<Vec<ContentPage>>;
}

/// SQLite-backed holder/page repository.
pub struct SqlitePageRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePageRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn, &["holders", "content_pages"])?;
        Ok(Self { conn })
    }
}

impl PageRepository for SqlitePageRepository<'_> {
    fn create_holder(&self, holder: &Holder) -> RepoResult<HolderId> {
        holder.validate()?;
        self.conn.execute(
            "INSERT INTO holders (uuid, title, type_uuid) VALUES (?1, ?2, ?3);",
            params![
                holder.uuid.to_string(),
                holder.title.as_str(),
                holder.type_uuid.map(|value| value.to_string()),
            ],
        )?;
        Ok(holder.uuid)
    }

    fn get_holder(&self, id: HolderId) -> RepoResult<Option<Holder>> {
        self.conn
            .query_row(
                &format!("{HOLDER_SELECT_SQL} WHERE uuid = ?1;"),
                [id.to_string()],
                |row| Ok(parse_holder_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn bind_holder_type(&self, id: HolderId, type_uuid: ContentTypeId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE holders
             SET type_uuid = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), type_uuid.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn save_page(&self, page: &ContentPage) -> RepoResult<()> {
        page.validate()?;
        self.conn.execute(
            "INSERT INTO content_pages (
                uuid,
                holder_uuid,
                type_uuid,
                title,
                content,
                summary,
                external_link,
                date,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(uuid) DO UPDATE SET
                holder_uuid = excluded.holder_uuid,
                type_uuid = excluded.type_uuid,
                title = excluded.title,
                content = excluded.content,
                summary = excluded.summary,
                external_link = excluded.external_link,
                date = excluded.date,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                page.uuid.to_string(),
                page.holder_uuid.map(|value| value.to_string()),
                page.type_uuid.map(|value| value.to_string()),
                page.title.as_str(),
                page.content.as_str(),
                page.summary.as_str(),
                page.external_link.as_deref(),
                page.date,
                now_epoch_ms(),
            ],
        )?;
        Ok(())
    }

    fn get_page(&self, id: PageId) -> RepoResult<Option<ContentPage>> {
        self.conn
            .query_row(
                &format!("{PAGE_SELECT_SQL} WHERE uuid = ?1;"),
                [id.to_string()],
                |row| Ok(parse_page_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_holder_pages(&self, holder: HolderId) -> RepoResult<Vec<ContentPage>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PAGE_SELECT_SQL}
             WHERE holder_uuid = ?1
             ORDER BY created_at ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([holder.to_string()])?;
        let mut pages = Vec::new();
        while let Some(row) = rows.next()? {
            pages.push(parse_page_row(row)?);
        }
        Ok(pages)
    }
}

fn parse_holder_row(row: &Row<'_>) -> RepoResult<Holder> {
    let uuid_text: String = row.get("uuid")?;
    Ok(Holder {
        uuid: parse_uuid(&uuid_text, "holders.uuid")?,
        title: row.get("title")?,
        type_uuid: parse_optional_uuid(row.get("type_uuid")?, "holders.type_uuid")?,
    })
}

fn parse_page_row(row: &Row<'_>) -> RepoResult<ContentPage> {
    let uuid_text: String = row.get("uuid")?;
    let page = ContentPage {
        uuid: parse_uuid(&uuid_text, "content_pages.uuid")?,
        holder_uuid: parse_optional_uuid(row.get("holder_uuid")?, "content_pages.holder_uuid")?,
        type_uuid: parse_optional_uuid(row.get("type_uuid")?, "content_pages.type_uuid")?,
        title: row.get("title")?,
        content: row.get("content")?,
        summary: row.get("summary")?,
        external_link: row.get("external_link")?,
        date: row.get("date")?,
    };
    page.validate()?;
    Ok(page)
}
