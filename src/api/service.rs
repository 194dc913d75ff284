//! 任务生命周期操作（HTTP 路由背后的服务层）
//!
//! 每个方法对应一个接口，校验状态后修改数据库，需要浏览器的工作交给 `JobRunner` 在后台执行。
//! 任务处于 PROCESSING 时拒绝一切修改。

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use super::error::{ApiError, ApiResult};
use crate::db::{activity_repo, contact_repo, job_repo, template_repo, Database};
use crate::infrastructure::{AbortAllReport, AbortOutcome, SessionCoordinator, SessionSnapshot};
use crate::models::{ActionType, ActivityLog, Contact, Job, JobStatus, SiteType, Template, WorkflowStep};
use crate::orchestrator::{JobRunner, WorkflowOptions};
use crate::services::NameDirectory;

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowQueued {
    pub success: bool,
    pub job_id: i64,
    pub company: Option<String>,
    pub steps_completed: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetryStarted {
    pub job_id: i64,
    /// `extract_company` 或 `workflow_queued`
    pub action: &'static str,
    pub workflow_step: WorkflowStep,
}

#[derive(Debug, Clone, Serialize)]
pub struct AbortResponse {
    pub job_id: i64,
    /// `signalled`：正在运行，已请求中止；`dequeued`：尚在排队，已移出
    pub outcome: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingHebrewNames {
    pub job_id: i64,
    pub workflow_step: WorkflowStep,
    pub pending_names: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HebrewNameInput {
    pub english_name: String,
    pub hebrew_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompanyInput {
    pub company_name: String,
    pub site_type: SiteType,
    #[serde(default)]
    pub platform_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateInput {
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub content_male: Option<String>,
    #[serde(default)]
    pub content_female: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

/// 服务层句柄，clone 开销很小
#[derive(Clone)]
pub struct JobService {
    db: Database,
    runner: JobRunner,
    names: Arc<NameDirectory>,
}

impl JobService {
    pub fn new(db: Database, runner: JobRunner, names: Arc<NameDirectory>) -> Self {
        Self { db, runner, names }
    }

    pub fn session(&self) -> &Arc<SessionCoordinator> {
        self.runner.orchestrator().session()
    }

    fn load(&self, job_id: i64) -> ApiResult<Job> {
        job_repo::find_by_id(&self.db, job_id)?.ok_or_else(|| ApiError::job_not_found(job_id))
    }

    /// 加载任务，并拒绝正在运行（或已在浏览器队列中）的任务
    fn load_idle(&self, job_id: i64) -> ApiResult<Job> {
        let job = self.load(job_id)?;
        if job.is_processing() || self.session().current_job() == Some(job_id) {
            return Err(ApiError::BadRequest("Job is currently processing".to_string()));
        }
        if self.session().is_queued(job_id) {
            return Err(ApiError::BadRequest("Job is already queued".to_string()));
        }
        Ok(job)
    }

    fn record(&self, job_id: i64, action: ActionType, description: &str, details: Option<serde_json::Value>) -> ApiResult<()> {
        activity_repo::record(&self.db, Some(job_id), action, description, details)?;
        Ok(())
    }

    fn queue(&self, job: &Job, options: WorkflowOptions) -> WorkflowQueued {
        self.runner.submit(job.id, options);
        WorkflowQueued {
            success: true,
            job_id: job.id,
            company: job.company().map(str::to_string),
            steps_completed: vec!["workflow_queued".to_string()],
        }
    }

    // ========== 任务 ==========

    /// 创建任务并在后台提取公司名
    ///
    /// # 参数
    /// - `url`: 职位链接
    ///
    /// # 返回
    /// 返回新建的任务；链接为空返回 400，重复提交返回 409
    pub fn create_job(&self, url: &str) -> ApiResult<Job> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ApiError::BadRequest("URL is required".to_string()));
        }
        if let Some(existing) = job_repo::find_by_url(&self.db, url)? {
            return Err(duplicate(existing.id));
        }

        let job = match job_repo::insert(&self.db, url) {
            Ok(job) => job,
            Err(e) if e.is_unique_violation() => {
                let existing = job_repo::find_by_url(&self.db, url)?;
                return Err(existing.map(|j| duplicate(j.id)).unwrap_or_else(|| ApiError::Conflict(e.to_string())));
            }
            Err(e) => return Err(e.into()),
        };
        self.record(job.id, ActionType::JobSubmitted, &format!("Job submitted: {}", url), Some(json!({ "url": url })))?;
        info!("[任务 {}] 📥 新任务: {}", job.id, url);

        self.runner.spawn_extraction(job.id);
        Ok(job)
    }

    pub fn list_jobs(&self) -> ApiResult<Vec<Job>> {
        Ok(job_repo::list(&self.db)?)
    }

    pub fn get_job(&self, job_id: i64) -> ApiResult<Job> {
        self.load(job_id)
    }

    pub fn job_contacts(&self, job_id: i64) -> ApiResult<Vec<Contact>> {
        self.load(job_id)?;
        Ok(contact_repo::list_for_job(&self.db, job_id)?)
    }

    pub fn job_activity(&self, job_id: i64) -> ApiResult<Vec<ActivityLog>> {
        self.load(job_id)?;
        Ok(activity_repo::list_for_job(&self.db, job_id)?)
    }

    pub fn recent_activity(&self, limit: usize) -> ApiResult<Vec<ActivityLog>> {
        Ok(activity_repo::list_recent(&self.db, limit)?)
    }

    // ========== 公司名 ==========

    pub fn submit_company(&self, job_id: i64, input: &CompanyInput) -> ApiResult<Job> {
        let job = self.runner.processor().submit_company_info(
            job_id,
            &input.company_name,
            input.site_type,
            input.platform_name.as_deref(),
        )?;
        Ok(job)
    }

    pub fn update_company(&self, job_id: i64, company_name: &str) -> ApiResult<Job> {
        self.load_idle(job_id)?;
        Ok(self.runner.processor().update_company_name(job_id, company_name)?)
    }

    // ========== 工作流 ==========

    /// 入队并立即返回，工作流在后台运行
    ///
    /// # 参数
    /// - `job_id`: 任务 ID
    /// - `options`: 工作流选项
    ///
    /// # 返回
    /// 返回入队确认；任务正在处理、已在队列或已完成时返回 400
    pub fn trigger_workflow(&self, job_id: i64, options: WorkflowOptions) -> ApiResult<WorkflowQueued> {
        let job = self.load_idle(job_id)?;
        if job.company().is_none() {
            return Err(ApiError::BadRequest("Company name not extracted yet".to_string()));
        }
        if job.workflow_step == WorkflowStep::Done {
            return Err(ApiError::BadRequest("Workflow already completed".to_string()));
        }
        Ok(self.queue(&job, options))
    }

    /// 重试失败或中止的任务：没有公司名时重新提取，否则从当前步骤继续
    pub fn retry_job(&self, job_id: i64) -> ApiResult<RetryStarted> {
        let mut job = self.load_idle(job_id)?;
        if !job.is_retryable() {
            return Err(ApiError::BadRequest(format!(
                "Only failed or aborted jobs can be retried (status: {})",
                job.status
            )));
        }

        job.error_message = None;
        if job.company().is_none() {
            job.status = JobStatus::Pending;
            job_repo::update(&self.db, &job)?;
            info!("[任务 {}] 🔁 重新提取公司名", job_id);
            self.runner.spawn_extraction(job_id);
            return Ok(RetryStarted {
                job_id,
                action: "extract_company",
                workflow_step: job.workflow_step,
            });
        }

        job.status = JobStatus::Completed;
        job_repo::update(&self.db, &job)?;
        info!("[任务 {}] 🔁 从 {} 继续工作流", job_id, job.workflow_step);
        self.queue(&job, WorkflowOptions::default());
        Ok(RetryStarted {
            job_id,
            action: "workflow_queued",
            workflow_step: job.workflow_step,
        })
    }

    // ========== 中止与会话 ==========

    pub fn abort_all(&self) -> AbortAllReport {
        self.session().abort_all()
    }

    /// 中止当前任务，或把排队中的任务移出队列
    ///
    /// # 参数
    /// - `job_id`: 任务 ID
    ///
    /// # 返回
    /// 返回中止方式；任务既不在运行也不在队列中时返回 400
    pub fn abort_job(&self, job_id: i64) -> ApiResult<AbortResponse> {
        let outcome = match self.session().request_abort(job_id) {
            AbortOutcome::Signalled => "signalled",
            AbortOutcome::Dequeued => "dequeued",
            AbortOutcome::NotActive => {
                return Err(ApiError::BadRequest(format!("Job {} is not running or queued", job_id)));
            }
        };
        Ok(AbortResponse { job_id, outcome })
    }

    pub fn current_session(&self) -> SessionSnapshot {
        self.session().snapshot()
    }

    // ========== 希伯来文名字 ==========

    pub fn pending_hebrew_names(&self, job_id: i64) -> ApiResult<PendingHebrewNames> {
        let job = self.load(job_id)?;
        Ok(PendingHebrewNames {
            job_id,
            workflow_step: job.workflow_step,
            pending_names: job.pending_hebrew_names,
        })
    }

    /// 保存译名；覆盖了全部待译名字后从 NEEDS_HEBREW_NAMES 继续工作流
    ///
    /// # 参数
    /// - `job_id`: 处于 NEEDS_HEBREW_NAMES 的任务
    /// - `names`: 英文名 → 希伯来文名
    ///
    /// # 返回
    /// 返回入队确认；仍有未翻译的名字时返回 400 并列出缺少的名字
    pub fn submit_hebrew_names(&self, job_id: i64, names: &[HebrewNameInput]) -> ApiResult<WorkflowQueued> {
        let mut job = self.load_idle(job_id)?;
        if job.workflow_step != WorkflowStep::NeedsHebrewNames {
            return Err(ApiError::BadRequest("Job is not waiting for Hebrew names".to_string()));
        }
        if names.is_empty() {
            return Err(ApiError::BadRequest("No names provided".to_string()));
        }

        for pair in names {
            let english = pair.english_name.trim();
            let hebrew = pair.hebrew_name.trim();
            if english.is_empty() || hebrew.is_empty() {
                return Err(ApiError::BadRequest("Both english_name and hebrew_name are required".to_string()));
            }
            self.names.save_translation(english, hebrew)?;
        }

        let provided: Vec<String> = names.iter().map(|n| n.english_name.clone()).collect();
        let missing = job.missing_translations(&provided);
        if !missing.is_empty() {
            let message = format!("Missing translations for: {}", missing.join(", "));
            warn!("[任务 {}] {}", job_id, message);
            return Err(ApiError::BadRequest(message));
        }

        job.pending_hebrew_names.clear();
        job.status = JobStatus::Completed;
        job.error_message = None;
        job_repo::update(&self.db, &job)?;
        info!("[任务 {}] ✅ 已收到 {} 个译名，继续发消息", job_id, names.len());
        Ok(self.queue(&job, WorkflowOptions::default()))
    }

    // ========== 手动状态操作 ==========

    pub fn mark_done(&self, job_id: i64) -> ApiResult<Job> {
        self.finish(job_id, JobStatus::Done)
    }

    pub fn mark_rejected(&self, job_id: i64) -> ApiResult<Job> {
        self.finish(job_id, JobStatus::Rejected)
    }

    fn finish(&self, job_id: i64, status: JobStatus) -> ApiResult<Job> {
        let mut job = self.load_idle(job_id)?;
        job.status = status;
        job.workflow_step = WorkflowStep::Done;
        job.pending_hebrew_names.clear();
        job.processed_at = Some(Utc::now());
        job_repo::update(&self.db, &job)?;
        info!("[任务 {}] 手动标记为 {}", job_id, status);
        Ok(job)
    }

    /// 删除全部联系人，回到工作流起点
    pub fn reset_job(&self, job_id: i64) -> ApiResult<Job> {
        let mut job = self.load_idle(job_id)?;
        let removed = contact_repo::delete_for_job(&self.db, job_id)?;
        job.workflow_step = WorkflowStep::CompanyExtraction;
        job.status = JobStatus::Completed;
        job.error_message = None;
        job.pending_hebrew_names.clear();
        job.last_reply_check_at = None;
        job_repo::update(&self.db, &job)?;
        info!("[任务 {}] ♻️ 已重置，删除 {} 个联系人", job_id, removed);
        Ok(job)
    }

    /// 已完成的任务继续寻找新联系人：删除已回复的联系人后强制重新搜索
    pub fn find_more(&self, job_id: i64) -> ApiResult<WorkflowQueued> {
        let mut job = self.load_idle(job_id)?;
        if job.workflow_step != WorkflowStep::Done {
            return Err(ApiError::BadRequest("Find more is only available for completed workflows".to_string()));
        }
        if job.company().is_none() {
            return Err(ApiError::BadRequest("Company name not extracted yet".to_string()));
        }

        let removed = contact_repo::delete_replied_for_job(&self.db, job_id)?;
        let awaiting = contact_repo::awaiting_reply(&self.db, job_id)?;
        job.workflow_step = if awaiting.is_empty() {
            WorkflowStep::SearchConnections
        } else {
            WorkflowStep::WaitingForReply
        };
        job.status = JobStatus::Completed;
        job.error_message = None;
        job_repo::update(&self.db, &job)?;
        info!("[任务 {}] 🔍 寻找更多联系人（删除 {} 个已回复）", job_id, removed);

        Ok(self.queue(
            &job,
            WorkflowOptions {
                force_search: true,
                ..WorkflowOptions::default()
            },
        ))
    }

    // ========== 联系人 ==========

    /// 用户手动确认收到回复
    pub fn mark_contact_replied(&self, contact_id: i64) -> ApiResult<Job> {
        let contact = self.load_contact(contact_id)?;
        let mut job = self.load_idle(contact.job_id)?;

        let now = Utc::now();
        if contact_repo::mark_reply_received(&self.db, contact_id, now)? {
            self.record(
                job.id,
                ActionType::ReplyReceived,
                &format!("Received reply from {}!", contact.name),
                Some(json!({ "contact_id": contact_id, "manual": true })),
            )?;
        }
        job.workflow_step = WorkflowStep::Done;
        job.status = JobStatus::Completed;
        job.processed_at = Some(now);
        job_repo::update(&self.db, &job)?;
        Ok(job)
    }

    /// 删除联系人；最后一个已发消息的联系人被删除时回到 WAITING_FOR_ACCEPT
    pub fn delete_contact(&self, contact_id: i64) -> ApiResult<Job> {
        let contact = self.load_contact(contact_id)?;
        let mut job = self.load_idle(contact.job_id)?;

        contact_repo::delete(&self.db, contact_id)?;
        if job.workflow_step == WorkflowStep::WaitingForReply && contact_repo::count_messaged(&self.db, job.id)? == 0 {
            job.workflow_step = WorkflowStep::WaitingForAccept;
            job_repo::update(&self.db, &job)?;
            info!("[任务 {}] 已无发过消息的联系人，回到 {}", job.id, job.workflow_step);
        }
        Ok(job)
    }

    fn load_contact(&self, contact_id: i64) -> ApiResult<Contact> {
        contact_repo::find_by_id(&self.db, contact_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Contact {} not found", contact_id)))
    }

    // ========== 模板 ==========

    pub fn list_templates(&self) -> ApiResult<Vec<Template>> {
        Ok(template_repo::list(&self.db)?)
    }

    pub fn create_template(&self, input: &TemplateInput) -> ApiResult<Template> {
        if input.name.trim().is_empty() || input.content.trim().is_empty() {
            return Err(ApiError::BadRequest("Template name and content are required".to_string()));
        }
        Ok(template_repo::insert(
            &self.db,
            input.name.trim(),
            &input.content,
            input.content_male.as_deref(),
            input.content_female.as_deref(),
            input.is_default,
        )?)
    }
}

fn duplicate(existing_id: i64) -> ApiError {
    ApiError::Conflict(format!("This job URL was already submitted (Job #{})", existing_id))
}
