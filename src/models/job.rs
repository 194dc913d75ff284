use chrono::{DateTime, Utc};
use serde::Serialize;

text_enum! {
    /// 任务的粗粒度状态（给界面看）
    ///
    /// `Completed` 表示"本阶段结束"，任务可能仍处于工作流中间。
    pub enum JobStatus {
        Pending => "pending",
        Processing => "processing",
        NeedsInput => "needs_input",
        Completed => "completed",
        Failed => "failed",
        Aborted => "aborted",
        Done => "done",
        Rejected => "rejected",
    }
}

text_enum! {
    /// 工作流的恢复点，编排器只根据它做分派
    pub enum WorkflowStep {
        CompanyExtraction => "company_extraction",
        SearchConnections => "search_connections",
        MessageConnections => "message_connections",
        SearchLinkedin => "search_linkedin",
        SendRequests => "send_requests",
        NeedsHebrewNames => "needs_hebrew_names",
        WaitingForReply => "waiting_for_reply",
        WaitingForAccept => "waiting_for_accept",
        Done => "done",
    }
}

/// 一条提交的职位链接
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub id: i64,
    pub url: String,
    pub company_name: Option<String>,
    pub job_title: Option<String>,
    pub status: JobStatus,
    pub workflow_step: WorkflowStep,
    pub error_message: Option<String>,
    /// 仅在 `workflow_step == NeedsHebrewNames` 时非空
    pub pending_hebrew_names: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub last_reply_check_at: Option<DateTime<Utc>>,
}

impl Job {
    /// 已解析出的公司名（空白视为未解析）
    pub fn company(&self) -> Option<&str> {
        self.company_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    pub fn is_processing(&self) -> bool {
        self.status == JobStatus::Processing
    }

    /// 用户可以重试的终止状态
    pub fn is_retryable(&self) -> bool {
        matches!(self.status, JobStatus::Failed | JobStatus::Aborted)
    }

    /// `provided` 未覆盖的待翻译名字（不区分大小写）
    pub fn missing_translations<'a>(&'a self, provided: &[String]) -> Vec<&'a str> {
        let provided: Vec<String> = provided.iter().map(|n| n.trim().to_lowercase()).collect();
        self.pending_hebrew_names
            .iter()
            .filter(|pending| !provided.contains(&pending.trim().to_lowercase()))
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        Job {
            id: 1,
            url: "https://jobs.lever.co/acme/123".to_string(),
            company_name: Some("  Acme ".to_string()),
            job_title: None,
            status: JobStatus::Completed,
            workflow_step: WorkflowStep::NeedsHebrewNames,
            error_message: None,
            pending_hebrew_names: vec!["Bob".to_string(), "Dana".to_string()],
            created_at: Utc::now(),
            processed_at: None,
            last_reply_check_at: None,
        }
    }

    #[test]
    fn status_and_step_round_trip_through_text() {
        for status in JobStatus::ALL {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), *status);
        }
        for step in WorkflowStep::ALL {
            assert_eq!(step.as_str().parse::<WorkflowStep>().unwrap(), *step);
        }
        assert!("sleeping".parse::<JobStatus>().is_err());
    }

    #[test]
    fn company_is_trimmed_and_blank_means_missing() {
        let mut job = job();
        assert_eq!(job.company(), Some("Acme"));
        job.company_name = Some("   ".to_string());
        assert_eq!(job.company(), None);
    }

    #[test]
    fn missing_translations_are_case_insensitive() {
        let job = job();
        assert_eq!(job.missing_translations(&["bob".to_string()]), vec!["Dana"]);
        assert!(job
            .missing_translations(&["BOB".to_string(), "dana".to_string()])
            .is_empty());
    }

    #[test]
    fn serializes_enums_as_snake_case() {
        let value = serde_json::to_value(job()).unwrap();
        assert_eq!(value["status"], "completed");
        assert_eq!(value["workflow_step"], "needs_hebrew_names");
    }
}
