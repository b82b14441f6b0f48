//! Content type registry contracts and SQLite implementation.
//!
//! # Responsibility
//! - Resolve a type title to its durable record, creating it on demand.
//! - Pick a fallback type for holders that have none yet.
//!
//! # Invariants
//! - One row per distinct title (`UNIQUE` constraint + conflict-free insert).
//! - `any_existing` is deterministic: oldest `created_at`, then `title`.

use super::{parse_uuid, RepoResult};
use crate::db::ensure_schema_ready;
use crate::model::content_type::{ContentType, ContentTypeId};
use crate::model::ModelValidationError;
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};

const TYPE_SELECT_SQL: &str = "SELECT uuid, title, created_at FROM content_types";

/// Registry of durable content types.
pub trait TypeRegistry {
    /// Returns the type titled `title`, creating and persisting it if absent.
    fn resolve_or_create(&self, title: &str) -> RepoResult<ContentType>;
    /// Returns one existing type, or `None` when no type exists at all.
    fn any_existing(&self) -> RepoResult<Option<ContentType>>;
    fn get_type(&self, id: ContentTypeId) -> RepoResult<Option<ContentType>>;
    fn find_by_title(&self, title: &str) -> RepoResult<Option<ContentType>>;
    /// Lists all types sorted by title.
    fn list_types(&self) -> RepoResult<Vec<ContentType>>;
}

/// SQLite-backed content type registry.
pub struct SqliteTypeRegistry<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTypeRegistry<'conn> {
    /// Creates a registry from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn, &["content_types"])?;
        Ok(Self { conn })
    }
}

impl TypeRegistry for SqliteTypeRegistry<'_> {
    fn resolve_or_create(&self, title: &str) -> RepoResult<ContentType> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ModelValidationError::BlankTitle("content type").into());
        }

        let candidate = ContentType::new(title);
        let inserted = self.conn.execute(
            "INSERT INTO content_types (uuid, title, created_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(title) DO NOTHING;",
            params![
                candidate.uuid.to_string(),
                candidate.title.as_str(),
                candidate.created_at
            ],
        )?;
        if inserted == 1 {
            info!(
                "event=type_create module=repo status=ok type_uuid={}",
                candidate.uuid
            );
            return Ok(candidate);
        }

        self.find_by_title(title)?.ok_or_else(|| {
            super::RepoError::InvalidData(format!(
                "content type `{title}` neither inserted nor found"
            ))
        })
    }

    fn any_existing(&self) -> RepoResult<Option<ContentType>> {
        self.conn
            .query_row(
                &format!("{TYPE_SELECT_SQL} ORDER BY created_at ASC, title ASC LIMIT 1;"),
                [],
                |row| Ok(parse_type_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn get_type(&self, id: ContentTypeId) -> RepoResult<Option<ContentType>> {
        self.conn
            .query_row(
                &format!("{TYPE_SELECT_SQL} WHERE uuid = ?1;"),
                [id.to_string()],
                |row| Ok(parse_type_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn find_by_title(&self, title: &str) -> RepoResult<Option<ContentType>> {
        self.conn
            .query_row(
                &format!("{TYPE_SELECT_SQL} WHERE title = ?1;"),
                [title.trim()],
                |row| Ok(parse_type_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_types(&self) -> RepoResult<Vec<ContentType>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TYPE_SELECT_SQL} ORDER BY title ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut types = Vec::new();
        while let Some(row) = rows.next()? {
            types.push(parse_type_row(row)?);
        }
        Ok(types)
    }
}

fn parse_type_row(row: &Row<'_>) -> RepoResult<ContentType> {
    let uuid_text: String = row.get("uuid")?;
    let content_type = ContentType {
        uuid: parse_uuid(&uuid_text, "content_types.uuid")?,
        title: row.get("title")?,
        created_at: row.get("created_at")?,
    };
    content_type.validate()?;
    Ok(content_type)
}
