//! `activity_logs` 表（只追加）

use chrono::Utc;
use rusqlite::{params, Row};
use serde_json::Value as JsonValue;

use super::{enum_column, time_column, time_to_text, Database, DatabaseError};
use crate::models::{ActionType, ActivityLog};

fn from_row(row: &Row<'_>) -> rusqlite::Result<ActivityLog> {
    let details: Option<String> = row.get("details")?;
    Ok(ActivityLog {
        id: row.get("id")?,
        job_id: row.get("job_id")?,
        action_type: enum_column(row, "action_type")?,
        description: row.get("description")?,
        details: details.and_then(|text| serde_json::from_str(&text).ok()),
        created_at: time_column(row, "created_at")?,
    })
}

/// 写入一条活动记录
///
/// # 参数
/// - `job_id`: 关联的任务（系统级记录为 `None`）
/// - `action_type`: 动作类型
/// - `description`: 展示给用户的描述
/// - `details`: 附加的 JSON 数据
///
/// # 返回
/// 返回新记录的 ID
pub fn record(
    db: &Database,
    job_id: Option<i64>,
    action_type: ActionType,
    description: &str,
    details: Option<JsonValue>,
) -> Result<i64, DatabaseError> {
    let details = details.map(|d| d.to_string());
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO activity_logs (job_id, action_type, description, details, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![job_id, action_type.as_str(), description, details, time_to_text(&Utc::now())],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// 按时间先后
pub fn list_for_job(db: &Database, job_id: i64) -> Result<Vec<ActivityLog>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM activity_logs WHERE job_id = ?1 ORDER BY id")?;
        let logs = stmt
            .query_map(params![job_id], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    })
}

/// 最新的在前
pub fn list_recent(db: &Database, limit: usize) -> Result<Vec<ActivityLog>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM activity_logs ORDER BY id DESC LIMIT ?1")?;
        let logs = stmt
            .query_map(params![limit as i64], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    })
}
