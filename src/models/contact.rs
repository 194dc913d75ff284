use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Gender;

/// 为某个任务发现的 LinkedIn 联系人
///
/// 身份为 `(linkedin_url, job_id)`：同一个人在不同任务下各有一条记录。
/// `message_sent_at` / `connection_requested_at` / `reply_received_at` 各自最多被写入一次。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contact {
    pub id: i64,
    pub job_id: i64,
    pub name: String,
    pub linkedin_url: String,
    pub company: Option<String>,
    pub position: Option<String>,
    /// 保存时是否为 1 度人脉
    pub is_connection: bool,
    pub gender: Gender,
    pub message_sent_at: Option<DateTime<Utc>>,
    pub message_content: Option<String>,
    pub connection_requested_at: Option<DateTime<Utc>>,
    pub reply_received_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Contact {
    /// 已发送消息、尚未收到回复
    pub fn is_awaiting_reply(&self) -> bool {
        self.message_sent_at.is_some() && self.reply_received_at.is_none()
    }
}

/// 新联系人
#[derive(Debug, Clone)]
pub struct NewContact {
    pub job_id: i64,
    pub name: String,
    pub linkedin_url: String,
    pub company: Option<String>,
    pub position: Option<String>,
    pub is_connection: bool,
    pub gender: Gender,
}
