//! `hebrew_names` 表：用户提供的英文名 → 希伯来文名

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use super::{time_to_text, Database, DatabaseError};

/// 英文名统一小写存储
pub fn upsert(db: &Database, english_name: &str, hebrew_name: &str) -> Result<(), DatabaseError> {
    let key = english_name.trim().to_lowercase();
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO hebrew_names (english_name, hebrew_name, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(english_name) DO UPDATE SET hebrew_name = excluded.hebrew_name",
            params![key, hebrew_name.trim(), time_to_text(&Utc::now())],
        )?;
        Ok(())
    })
}

pub fn find(db: &Database, english_name: &str) -> Result<Option<String>, DatabaseError> {
    let key = english_name.trim().to_lowercase();
    db.with_conn(|conn| {
        let name = conn
            .query_row(
                "SELECT hebrew_name FROM hebrew_names WHERE english_name = ?1",
                params![key],
                |r| r.get(0),
            )
            .optional()?;
        Ok(name)
    })
}

pub fn list_all(db: &Database) -> Result<Vec<(String, String)>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT english_name, hebrew_name FROM hebrew_names ORDER BY english_name")?;
        let pairs = stmt
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pairs)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_is_case_insensitive_and_overwrites() {
        let db = Database::open_in_memory().unwrap();
        upsert(&db, "Bob", "בוב").unwrap();
        upsert(&db, " BOB ", "באב").unwrap();

        assert_eq!(find(&db, "bob").unwrap().as_deref(), Some("באב"));
        assert_eq!(list_all(&db).unwrap().len(), 1);
        assert!(find(&db, "alice").unwrap().is_none());
    }
}
