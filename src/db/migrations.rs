//! 数据库迁移
//!
//! 已执行的迁移记录在 `_migrations` 表中，按版本号顺序执行尚未执行的迁移。

use rusqlite::Connection;
use tracing::info;

use super::error::DatabaseError;

struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create_jobs_table",
        sql: include_str!("sql/001_create_jobs.sql"),
    },
    Migration {
        version: 2,
        description: "create_contacts_table",
        sql: include_str!("sql/002_create_contacts.sql"),
    },
    Migration {
        version: 3,
        description: "create_activity_logs_table",
        sql: include_str!("sql/003_create_activity_logs.sql"),
    },
    Migration {
        version: 4,
        description: "create_templates_table",
        sql: include_str!("sql/004_create_templates.sql"),
    },
    Migration {
        version: 5,
        description: "create_site_selectors_table",
        sql: include_str!("sql/005_create_site_selectors.sql"),
    },
    Migration {
        version: 6,
        description: "create_hebrew_names_table",
        sql: include_str!("sql/006_create_hebrew_names.sql"),
    },
];

pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |r| r.get(0),
    )?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current_version) {
        info!("执行数据库迁移 v{}: {}", migration.version, migration.description);

        conn.execute_batch(migration.sql)
            .map_err(|e| DatabaseError::Migration {
                version: migration.version,
                reason: e.to_string(),
            })?;

        conn.execute(
            "INSERT INTO _migrations (version, description) VALUES (?1, ?2)",
            rusqlite::params![migration.version, migration.description],
        )?;
    }

    Ok(())
}
