//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing order.
//! - Apply pending migrations atomically.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//!
//! # See also
//! - `0001_init.sql` for type/holder/page tables, `0002_attributes.sql` for
//!   the template/instance attribute table.

use crate::db::{DbError, DbResult};
use log::debug;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        sql: include_str!("0002_attributes.sql"),
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on the provided connection.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
        debug!(
            "event=db_migrate module=db status=ok version={}",
            migration.version
        );
    }
    tx.commit()?;

    Ok(())
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::{apply_migrations, current_user_version, latest_version, MIGRATIONS};
    use rusqlite::Connection;

    #[test]
    fn migration_versions_are_strictly_increasing() {
        for pair in MIGRATIONS.windows(2) {
            assert!(pair[0].version < pair[1].version);
        }
        assert_eq!(latest_version(), 2);
    }

    #[test]
    fn apply_migrations_is_idempotent_on_raw_connection() {
        let mut conn = Connection::open_in_memory().expect("raw connection should open");
        apply_migrations(&mut conn).expect("migrations should apply");
        apply_migrations(&mut conn).expect("migrations should apply");
        assert_eq!(
            current_user_version(&conn).expect("user_version should read"),
            latest_version()
        );
    }

    #[test]
    fn attribute_kind_check_rejects_template_with_link() {
        let mut conn = Connection::open_in_memory().expect("raw connection should open");
        apply_migrations(&mut conn).expect("migrations should apply");
        conn.execute_batch(
            "INSERT INTO content_pages (uuid, title) VALUES ('p1', 'Page');
             INSERT INTO attributes (uuid, page_uuid, kind, title)
             VALUES ('a1', 'p1', 'template', 'Author');",
        )
        .expect("statements should run");

        let err = conn.execute(
            "INSERT INTO attributes (uuid, page_uuid, kind, template_uuid, title)
             VALUES ('a2', 'p1', 'template', 'a1', 'Author');",
            [],
        );
        assert!(err.is_err());

        let err = conn.execute(
            "INSERT INTO attributes (uuid, page_uuid, kind, title)
             VALUES ('a3', 'p1', 'instance', 'Author');",
            [],
        );
        assert!(err.is_err());
    }
}
