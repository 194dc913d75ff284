//! `jobs` 表

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{enum_column, opt_time_column, opt_time_to_text, time_column, time_to_text, Database, DatabaseError};
use crate::models::{Job, JobStatus, WorkflowStep};

fn from_row(row: &Row<'_>) -> rusqlite::Result<Job> {
    let pending: Option<String> = row.get("pending_hebrew_names")?;
    let pending_hebrew_names = match pending {
        Some(text) if !text.is_empty() => serde_json::from_str(&text).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?,
        _ => Vec::new(),
    };

    Ok(Job {
        id: row.get("id")?,
        url: row.get("url")?,
        company_name: row.get("company_name")?,
        job_title: row.get("job_title")?,
        status: enum_column(row, "status")?,
        workflow_step: enum_column(row, "workflow_step")?,
        error_message: row.get("error_message")?,
        pending_hebrew_names,
        created_at: time_column(row, "created_at")?,
        processed_at: opt_time_column(row, "processed_at")?,
        last_reply_check_at: opt_time_column(row, "last_reply_check_at")?,
    })
}

fn pending_to_text(names: &[String]) -> Result<Option<String>, DatabaseError> {
    if names.is_empty() {
        Ok(None)
    } else {
        Ok(Some(serde_json::to_string(names)?))
    }
}

/// 插入新任务（PENDING / COMPANY_EXTRACTION）
///
/// URL 已存在时返回 UNIQUE 约束错误，见 [`DatabaseError::is_unique_violation`]。
pub fn insert(db: &Database, url: &str) -> Result<Job, DatabaseError> {
    let id = db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO jobs (url, status, workflow_step, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                url,
                JobStatus::Pending.as_str(),
                WorkflowStep::CompanyExtraction.as_str(),
                time_to_text(&Utc::now()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })?;

    find_by_id(db, id)?.ok_or(DatabaseError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
}

/// 覆盖除 `id`、`url`、`created_at` 之外的所有字段
pub fn update(db: &Database, job: &Job) -> Result<(), DatabaseError> {
    let pending = pending_to_text(&job.pending_hebrew_names)?;
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE jobs SET company_name=?2, job_title=?3, status=?4, workflow_step=?5,
             error_message=?6, pending_hebrew_names=?7, processed_at=?8, last_reply_check_at=?9
             WHERE id=?1",
            params![
                job.id,
                job.company_name,
                job.job_title,
                job.status.as_str(),
                job.workflow_step.as_str(),
                job.error_message,
                pending,
                opt_time_to_text(&job.processed_at),
                opt_time_to_text(&job.last_reply_check_at),
            ],
        )?;
        Ok(())
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<Job>, DatabaseError> {
    db.with_conn(|conn| {
        let job = conn
            .query_row("SELECT * FROM jobs WHERE id = ?1", params![id], from_row)
            .optional()?;
        Ok(job)
    })
}

pub fn find_by_url(db: &Database, url: &str) -> Result<Option<Job>, DatabaseError> {
    db.with_conn(|conn| {
        let job = conn
            .query_row("SELECT * FROM jobs WHERE url = ?1", params![url], from_row)
            .optional()?;
        Ok(job)
    })
}

/// 最新提交的在前
pub fn list(db: &Database) -> Result<Vec<Job>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM jobs ORDER BY created_at DESC, id DESC")?;
        let jobs = stmt.query_map([], from_row)?.collect::<Result<Vec<_>, _>>()?;
        Ok(jobs)
    })
}

pub fn find_by_status(db: &Database, status: JobStatus) -> Result<Vec<Job>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM jobs WHERE status = ?1 ORDER BY id")?;
        let jobs = stmt
            .query_map(params![status.as_str()], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(jobs)
    })
}

/// 处于 WAITING_FOR_REPLY、且上次回复检查早于 `cutoff`（或从未检查）的任务
pub fn find_due_reply_checks(db: &Database, cutoff: DateTime<Utc>) -> Result<Vec<Job>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM jobs
             WHERE workflow_step = ?1 AND status != ?2
               AND (last_reply_check_at IS NULL OR last_reply_check_at < ?3)
             ORDER BY id",
        )?;
        let jobs = stmt
            .query_map(
                params![
                    WorkflowStep::WaitingForReply.as_str(),
                    JobStatus::Processing.as_str(),
                    time_to_text(&cutoff),
                ],
                from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(jobs)
    })
}

pub fn delete(db: &Database, id: i64) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute("DELETE FROM jobs WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_starts_pending_at_company_extraction() {
        let db = Database::open_in_memory().unwrap();
        let job = insert(&db, "https://jobs.lever.co/acme/1").unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.workflow_step, WorkflowStep::CompanyExtraction);
        assert!(job.pending_hebrew_names.is_empty());
    }

    #[test]
    fn duplicate_url_is_a_unique_violation() {
        let db = Database::open_in_memory().unwrap();
        insert(&db, "https://jobs.lever.co/acme/1").unwrap();
        let err = insert(&db, "https://jobs.lever.co/acme/1").unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[test]
    fn update_persists_state_and_pending_names() {
        let db = Database::open_in_memory().unwrap();
        let mut job = insert(&db, "https://jobs.lever.co/acme/1").unwrap();
        job.company_name = Some("Acme".to_string());
        job.status = JobStatus::NeedsInput;
        job.workflow_step = WorkflowStep::NeedsHebrewNames;
        job.pending_hebrew_names = vec!["Bob".to_string()];
        job.last_reply_check_at = Some(Utc::now());
        update(&db, &job).unwrap();

        let loaded = find_by_id(&db, job.id).unwrap().unwrap();
        assert_eq!(loaded.status, JobStatus::NeedsInput);
        assert_eq!(loaded.workflow_step, WorkflowStep::NeedsHebrewNames);
        assert_eq!(loaded.pending_hebrew_names, vec!["Bob".to_string()]);
        assert_eq!(loaded.last_reply_check_at, job.last_reply_check_at);
    }

    #[test]
    fn due_reply_checks_skip_recent_and_processing() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();

        let mut never = insert(&db, "https://a.example/1").unwrap();
        never.workflow_step = WorkflowStep::WaitingForReply;
        never.status = JobStatus::Completed;
        update(&db, &never).unwrap();

        let mut recent = insert(&db, "https://a.example/2").unwrap();
        recent.workflow_step = WorkflowStep::WaitingForReply;
        recent.last_reply_check_at = Some(now);
        update(&db, &recent).unwrap();

        let mut running = insert(&db, "https://a.example/3").unwrap();
        running.workflow_step = WorkflowStep::WaitingForReply;
        running.status = JobStatus::Processing;
        update(&db, &running).unwrap();

        let due = find_due_reply_checks(&db, now - chrono::Duration::hours(1)).unwrap();
        assert_eq!(due.iter().map(|j| j.id).collect::<Vec<_>>(), vec![never.id]);
    }
}
