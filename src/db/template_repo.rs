//! `templates` 表

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use super::{time_to_text, Database, DatabaseError};
use crate::models::Template;

fn from_row(row: &Row<'_>) -> rusqlite::Result<Template> {
    Ok(Template {
        id: row.get("id")?,
        name: row.get("name")?,
        content: row.get("content")?,
        content_male: row.get("content_male")?,
        content_female: row.get("content_female")?,
        is_default: row.get("is_default")?,
    })
}

/// 新模板；`is_default` 为真时取消其他模板的默认标记
pub fn insert(
    db: &Database,
    name: &str,
    content: &str,
    content_male: Option<&str>,
    content_female: Option<&str>,
    is_default: bool,
) -> Result<Template, DatabaseError> {
    let now = time_to_text(&Utc::now());
    let id = db.with_conn(|conn| {
        if is_default {
            conn.execute("UPDATE templates SET is_default = 0", [])?;
        }
        conn.execute(
            "INSERT INTO templates (name, content, content_male, content_female, is_default, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![name, content, content_male, content_female, is_default, now],
        )?;
        Ok(conn.last_insert_rowid())
    })?;

    find_by_id(db, id)?.ok_or(DatabaseError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<Template>, DatabaseError> {
    db.with_conn(|conn| {
        let template = conn
            .query_row("SELECT * FROM templates WHERE id = ?1", params![id], from_row)
            .optional()?;
        Ok(template)
    })
}

/// 默认模板，没有则任取一个
pub fn find_default(db: &Database) -> Result<Option<Template>, DatabaseError> {
    db.with_conn(|conn| {
        let template = conn
            .query_row(
                "SELECT * FROM templates ORDER BY is_default DESC, id ASC LIMIT 1",
                [],
                from_row,
            )
            .optional()?;
        Ok(template)
    })
}

pub fn list(db: &Database) -> Result<Vec<Template>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM templates ORDER BY id")?;
        let templates = stmt.query_map([], from_row)?.collect::<Result<Vec<_>, _>>()?;
        Ok(templates)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_wins_then_falls_back_to_any() {
        let db = Database::open_in_memory().unwrap();
        assert!(find_default(&db).unwrap().is_none());

        let first = insert(&db, "plain", "Hi {name}", None, None, false).unwrap();
        assert_eq!(find_default(&db).unwrap().unwrap().id, first.id);

        let second = insert(&db, "main", "Hello {name}", Some("male"), None, true).unwrap();
        assert_eq!(find_default(&db).unwrap().unwrap().id, second.id);

        let third = insert(&db, "newer", "Hey {name}", None, None, true).unwrap();
        let defaults: Vec<_> = list(&db).unwrap().into_iter().filter(|t| t.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id, third.id);
    }
}
