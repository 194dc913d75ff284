//! `contacts` 表
//!
//! 时间戳字段只在为 NULL 时写入，保证"每个联系人最多发送一次消息"。

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{enum_column, opt_time_column, time_column, time_to_text, Database, DatabaseError};
use crate::models::{Contact, NewContact};

fn from_row(row: &Row<'_>) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: row.get("id")?,
        job_id: row.get("job_id")?,
        name: row.get("name")?,
        linkedin_url: row.get("linkedin_url")?,
        company: row.get("company")?,
        position: row.get("position")?,
        is_connection: row.get("is_connection")?,
        gender: enum_column(row, "gender")?,
        message_sent_at: opt_time_column(row, "message_sent_at")?,
        message_content: row.get("message_content")?,
        connection_requested_at: opt_time_column(row, "connection_requested_at")?,
        reply_received_at: opt_time_column(row, "reply_received_at")?,
        created_at: time_column(row, "created_at")?,
    })
}

pub fn insert(db: &Database, contact: &NewContact) -> Result<Contact, DatabaseError> {
    let id = db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO contacts (job_id, name, linkedin_url, company, position, is_connection, gender, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                contact.job_id,
                contact.name,
                contact.linkedin_url,
                contact.company,
                contact.position,
                contact.is_connection,
                contact.gender.as_str(),
                time_to_text(&Utc::now()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })?;

    find_by_id(db, id)?.ok_or(DatabaseError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<Contact>, DatabaseError> {
    db.with_conn(|conn| {
        let contact = conn
            .query_row("SELECT * FROM contacts WHERE id = ?1", params![id], from_row)
            .optional()?;
        Ok(contact)
    })
}

pub fn find_for_job(db: &Database, job_id: i64, linkedin_url: &str) -> Result<Option<Contact>, DatabaseError> {
    db.with_conn(|conn| {
        let contact = conn
            .query_row(
                "SELECT * FROM contacts WHERE job_id = ?1 AND linkedin_url = ?2",
                params![job_id, linkedin_url],
                from_row,
            )
            .optional()?;
        Ok(contact)
    })
}

pub fn list_for_job(db: &Database, job_id: i64) -> Result<Vec<Contact>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM contacts WHERE job_id = ?1 ORDER BY id")?;
        let contacts = stmt
            .query_map(params![job_id], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(contacts)
    })
}

/// 已发消息、尚未回复的联系人
pub fn awaiting_reply(db: &Database, job_id: i64) -> Result<Vec<Contact>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM contacts
             WHERE job_id = ?1 AND message_sent_at IS NOT NULL AND reply_received_at IS NULL
             ORDER BY id",
        )?;
        let contacts = stmt
            .query_map(params![job_id], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(contacts)
    })
}

pub fn count_messaged(db: &Database, job_id: i64) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM contacts WHERE job_id = ?1 AND message_sent_at IS NOT NULL",
            params![job_id],
            |r| r.get(0),
        )?;
        Ok(count as usize)
    })
}

/// 记录消息发送时间与内容
///
/// # 参数
/// - `id`: 联系人 ID
/// - `content`: 消息内容
/// - `at`: 发送时间
///
/// # 返回
/// 返回是否写入（已写过则不覆盖）
pub fn mark_message_sent(db: &Database, id: i64, content: Option<&str>, at: DateTime<Utc>) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute(
            "UPDATE contacts SET message_sent_at = ?2, message_content = ?3
             WHERE id = ?1 AND message_sent_at IS NULL",
            params![id, time_to_text(&at), content],
        )?;
        Ok(affected > 0)
    })
}

pub fn mark_connection_requested(db: &Database, id: i64, at: DateTime<Utc>) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute(
            "UPDATE contacts SET connection_requested_at = ?2
             WHERE id = ?1 AND connection_requested_at IS NULL",
            params![id, time_to_text(&at)],
        )?;
        Ok(affected > 0)
    })
}

pub fn mark_reply_received(db: &Database, id: i64, at: DateTime<Utc>) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute(
            "UPDATE contacts SET reply_received_at = ?2
             WHERE id = ?1 AND reply_received_at IS NULL",
            params![id, time_to_text(&at)],
        )?;
        Ok(affected > 0)
    })
}

/// 之前只是好友请求对象，现在成了 1 度人脉
pub fn mark_connected(db: &Database, id: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute("UPDATE contacts SET is_connection = 1 WHERE id = ?1", params![id])?;
        Ok(())
    })
}

pub fn delete(db: &Database, id: i64) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute("DELETE FROM contacts WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    })
}

pub fn delete_for_job(db: &Database, job_id: i64) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute("DELETE FROM contacts WHERE job_id = ?1", params![job_id])?;
        Ok(affected)
    })
}

pub fn delete_replied_for_job(db: &Database, job_id: i64) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute(
            "DELETE FROM contacts WHERE job_id = ?1 AND reply_received_at IS NOT NULL",
            params![job_id],
        )?;
        Ok(affected)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::job_repo;
    use crate::models::Gender;

    fn new_contact(job_id: i64, url: &str) -> NewContact {
        NewContact {
            job_id,
            name: "Bob Wilson".to_string(),
            linkedin_url: url.to_string(),
            company: Some("Acme".to_string()),
            position: Some("Engineer at Acme".to_string()),
            is_connection: true,
            gender: Gender::Male,
        }
    }

    #[test]
    fn message_sent_at_is_written_once() {
        let db = Database::open_in_memory().unwrap();
        let job = job_repo::insert(&db, "https://a.example/1").unwrap();
        let contact = insert(&db, &new_contact(job.id, "https://li/bob")).unwrap();

        let first = Utc::now();
        assert!(mark_message_sent(&db, contact.id, Some("hi"), first).unwrap());
        assert!(!mark_message_sent(&db, contact.id, Some("again"), Utc::now()).unwrap());

        let loaded = find_by_id(&db, contact.id).unwrap().unwrap();
        assert_eq!(loaded.message_content.as_deref(), Some("hi"));
        assert!(loaded.is_awaiting_reply());
        assert_eq!(awaiting_reply(&db, job.id).unwrap().len(), 1);
        assert_eq!(count_messaged(&db, job.id).unwrap(), 1);
    }

    #[test]
    fn replied_contacts_leave_the_awaiting_set() {
        let db = Database::open_in_memory().unwrap();
        let job = job_repo::insert(&db, "https://a.example/1").unwrap();
        let contact = insert(&db, &new_contact(job.id, "https://li/bob")).unwrap();
        mark_message_sent(&db, contact.id, None, Utc::now()).unwrap();
        mark_reply_received(&db, contact.id, Utc::now()).unwrap();

        assert!(awaiting_reply(&db, job.id).unwrap().is_empty());
        assert_eq!(delete_replied_for_job(&db, job.id).unwrap(), 1);
        assert!(list_for_job(&db, job.id).unwrap().is_empty());
    }

    #[test]
    fn same_person_is_separate_per_job() {
        let db = Database::open_in_memory().unwrap();
        let a = job_repo::insert(&db, "https://a.example/1").unwrap();
        let b = job_repo::insert(&db, "https://a.example/2").unwrap();
        insert(&db, &new_contact(a.id, "https://li/bob")).unwrap();
        insert(&db, &new_contact(b.id, "https://li/bob")).unwrap();

        assert!(find_for_job(&db, a.id, "https://li/bob").unwrap().is_some());
        assert!(find_for_job(&db, b.id, "https://li/bob").unwrap().is_some());
        assert!(insert(&db, &new_contact(a.id, "https://li/bob")).unwrap_err().is_unique_violation());
    }
}
