use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;

text_enum! {
    pub enum ActionType {
        JobSubmitted => "job_submitted",
        CompanyExtracted => "company_extracted",
        CompanyInputNeeded => "company_input_needed",
        SelectorLearned => "selector_learned",
        ConnectionSearch => "connection_search",
        ConnectionFound => "connection_found",
        ConnectionRequestSent => "connection_request_sent",
        MessageSent => "message_sent",
        ReplyReceived => "reply_received",
        LinkedinSearch => "linkedin_search",
        Error => "error",
    }
}

/// 只追加的审计记录，业务逻辑从不回读
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityLog {
    pub id: i64,
    pub job_id: Option<i64>,
    pub action_type: ActionType,
    pub description: String,
    pub details: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
}
