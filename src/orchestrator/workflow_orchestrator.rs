//! 工作流编排器 - 编排层
//!
//! 每次调用只推进一个可运行阶段，状态完全保存在 Job 行里：
//! 重新调用 `run_workflow` 就是恢复机制，进程重启后依然成立。
//!
//! 分派只看 `workflow_step`：
//!
//! | 当前步骤 | 动作 |
//! |---|---|
//! | DONE | 不做任何事 |
//! | NEEDS_HEBREW_NAMES | 清空待译名字，重新发消息 |
//! | WAITING_FOR_REPLY | 检查回复；`force_search` 时回到搜索 |
//! | WAITING_FOR_ACCEPT | 回到搜索 |
//! | MESSAGE_CONNECTIONS / SEARCH_LINKEDIN / SEND_REQUESTS | 上次中断，回到搜索 |
//! | COMPANY_EXTRACTION / SEARCH_CONNECTIONS | 逐级扩展搜索 |
//!
//! 中止：恢复调用前的 (status, step)，就像从未运行过。
//! 其他错误：FAILED + error_message，不回滚。

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use crate::browser::{BrowserAutomationSurface, ReplyProbe};
use crate::db::{activity_repo, contact_repo, job_repo, template_repo, Database};
use crate::error::WorkflowError;
use crate::infrastructure::SessionCoordinator;
use crate::models::{ActionType, Contact, Job, JobStatus, NewContact, Person, Template, WorkflowStep};
use crate::services::NameResolution;
use crate::workflow::{DegreeSearch, MessageComposer, SearchOutcome, SearchReport, SearchRequest, SearchSettings};

/// 触发工作流时的选项
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkflowOptions {
    pub template_id: Option<i64>,
    /// WAITING_FOR_REPLY 时不检查回复，直接重新搜索
    pub force_search: bool,
    /// 只查看 1 度人脉（好友请求是否已被接受），不再发新的好友请求
    pub first_degree_only: bool,
}

/// 一次调用的结果
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResult {
    pub success: bool,
    pub job_id: i64,
    pub company: Option<String>,
    pub steps_completed: Vec<String>,
    pub connections_found: usize,
    pub messages_sent: usize,
    pub connection_requests_sent: usize,
    pub error: Option<String>,
    pub aborted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_hebrew_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_failed: Option<Vec<String>>,
    pub workflow_step: WorkflowStep,
    pub status: JobStatus,
}

impl WorkflowResult {
    fn new(job: &Job) -> Self {
        Self {
            success: false,
            job_id: job.id,
            company: job.company().map(str::to_string),
            steps_completed: Vec::new(),
            connections_found: 0,
            messages_sent: 0,
            connection_requests_sent: 0,
            error: None,
            aborted: false,
            needs_hebrew_names: None,
            check_failed: None,
            workflow_step: job.workflow_step,
            status: job.status,
        }
    }

    fn step(&mut self, name: &str) {
        self.steps_completed.push(name.to_string());
    }

    fn fail(&mut self, message: impl Into<String>) {
        self.success = false;
        self.error = Some(message.into());
    }
}

/// 一个分支决定的下一状态
#[derive(Debug, Clone, PartialEq, Eq)]
struct Transition {
    step: WorkflowStep,
    status: JobStatus,
    error: Option<String>,
}

impl Transition {
    fn to(step: WorkflowStep, status: JobStatus) -> Self {
        Self {
            step,
            status,
            error: None,
        }
    }

    fn failed(step: WorkflowStep, message: impl Into<String>) -> Self {
        Self {
            step,
            status: JobStatus::Failed,
            error: Some(message.into()),
        }
    }

    fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }
}

/// 调用前的任务状态，中止时原样恢复
struct Snapshot {
    status: JobStatus,
    step: WorkflowStep,
    error: Option<String>,
    pending_hebrew_names: Vec<String>,
    last_reply_check_at: Option<chrono::DateTime<Utc>>,
}

impl Snapshot {
    fn of(job: &Job) -> Self {
        Self {
            status: job.status,
            step: job.workflow_step,
            error: job.error_message.clone(),
            pending_hebrew_names: job.pending_hebrew_names.clone(),
            last_reply_check_at: job.last_reply_check_at,
        }
    }

    fn restore(self, job: &mut Job) {
        job.status = self.status;
        job.workflow_step = self.step;
        job.error_message = self.error;
        job.pending_hebrew_names = self.pending_hebrew_names;
        job.last_reply_check_at = self.last_reply_check_at;
    }
}

/// 搜索阶段：首次搜索，或补充译名后重新发消息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Search,
    Resume,
}

impl Phase {
    fn label(&self) -> &'static str {
        match self {
            Phase::Search => "search_connections",
            Phase::Resume => "message_connections",
        }
    }

    fn working_step(&self) -> WorkflowStep {
        match self {
            Phase::Search => WorkflowStep::SearchConnections,
            Phase::Resume => WorkflowStep::MessageConnections,
        }
    }
}

/// 工作流编排器
///
/// 职责：
/// - 通过 `SessionCoordinator` 独占浏览器
/// - 按 `workflow_step` 分派并持久化新状态
/// - 记录联系人与活动日志
pub struct WorkflowOrchestrator {
    db: Database,
    session: Arc<SessionCoordinator>,
    surface: Arc<dyn BrowserAutomationSurface>,
    names: Arc<dyn NameResolution>,
    settings: SearchSettings,
}

impl WorkflowOrchestrator {
    pub fn new(
        db: Database,
        session: Arc<SessionCoordinator>,
        surface: Arc<dyn BrowserAutomationSurface>,
        names: Arc<dyn NameResolution>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            db,
            session,
            surface,
            names,
            settings,
        }
    }

    pub fn session(&self) -> &Arc<SessionCoordinator> {
        &self.session
    }

    /// 推进一个阶段
    ///
    /// 调用方须先把任务放入 `SessionCoordinator` 队列；前置条件不满足时任务会被移出队列。
    /// 只有任务不存在、前置条件不满足、数据库不可用时返回 `Err`，
    /// 其余结果（包括中止和失败）都在 `WorkflowResult` 中。
    ///
    /// # 参数
    /// - `job_id`: 任务 ID（须已入队）
    /// - `options`: 模板、强制搜索、只看 1 度人脉
    ///
    /// # 返回
    /// 返回本次调用的结果；中止时 `aborted = true`，任务状态恢复到调用前
    pub async fn run_workflow(&self, job_id: i64, options: &WorkflowOptions) -> Result<WorkflowResult, WorkflowError> {
        let template = match self.check_preconditions(job_id, options) {
            Ok(template) => template,
            Err(e) => {
                self.session.dequeue(job_id);
                warn!("[任务 {}] 无法启动工作流: {}", job_id, e);
                return Err(e);
            }
        };

        let Some(_guard) = self.session.acquire(job_id).await else {
            let job = self.load(job_id)?;
            let mut result = WorkflowResult::new(&job);
            result.aborted = true;
            result.fail("Workflow aborted by user");
            return Ok(result);
        };

        let mut job = self.load(job_id)?;
        let company = job
            .company()
            .map(str::to_string)
            .ok_or_else(|| WorkflowError::Precondition("Company name not extracted yet".to_string()))?;
        let snapshot = Snapshot::of(&job);

        self.session.clear_abort();
        job.status = JobStatus::Processing;
        job.error_message = None;
        job_repo::update(&self.db, &job)?;
        info!(
            "[任务 {}] ▶️ 开始工作流: {} ({} / {})",
            job_id, company, snapshot.step, snapshot.status
        );

        let mut result = WorkflowResult::new(&job);
        let mut failure = None;
        match self.advance(&mut job, &company, &template, options, &mut result).await {
            Ok(transition) => {
                job.workflow_step = transition.step;
                job.status = transition.status;
                job.error_message = transition.error;
            }
            Err(WorkflowError::Aborted) => {
                info!("[任务 {}] ⏹️ 已中止，恢复到 {} / {}", job_id, snapshot.step, snapshot.status);
                snapshot.restore(&mut job);
                result.aborted = true;
                result.fail("Workflow aborted by user");
            }
            Err(e) => {
                error!("[任务 {}] ❌ 工作流失败: {}", job_id, e);
                let message = e.to_string();
                job.status = JobStatus::Failed;
                job.error_message = Some(message.clone());
                result.fail(message.clone());
                failure = Some(message);
            }
        }

        // 先落库终态，PROCESSING 不能留到本次调用之后
        job_repo::update(&self.db, &job)?;
        if let Some(message) = failure {
            if let Err(e) = self.record(job_id, ActionType::Error, &format!("Workflow failed: {}", message), None) {
                warn!("[任务 {}] 写入失败记录出错: {}", job_id, e);
            }
        }
        result.workflow_step = job.workflow_step;
        result.status = job.status;
        info!(
            "[任务 {}] ⏹ 工作流结束: {} / {}，步骤 {:?}",
            job_id, job.workflow_step, job.status, result.steps_completed
        );
        Ok(result)
    }

    fn load(&self, job_id: i64) -> Result<Job, WorkflowError> {
        job_repo::find_by_id(&self.db, job_id)?.ok_or(WorkflowError::JobNotFound(job_id))
    }

    fn check_preconditions(&self, job_id: i64, options: &WorkflowOptions) -> Result<Template, WorkflowError> {
        let job = self.load(job_id)?;
        if job.company().is_none() {
            return Err(WorkflowError::Precondition("Company name not extracted yet".to_string()));
        }
        self.select_template(options.template_id)?
            .ok_or_else(|| WorkflowError::Precondition("No message template found".to_string()))
    }

    /// 指定模板优先，其次默认模板，再其次任意模板
    fn select_template(&self, template_id: Option<i64>) -> Result<Option<Template>, WorkflowError> {
        if let Some(id) = template_id {
            if let Some(template) = template_repo::find_by_id(&self.db, id)? {
                return Ok(Some(template));
            }
            warn!("模板 {} 不存在，使用默认模板", id);
        }
        Ok(template_repo::find_default(&self.db)?)
    }

    fn record(
        &self,
        job_id: i64,
        action: ActionType,
        description: &str,
        details: Option<serde_json::Value>,
    ) -> Result<(), WorkflowError> {
        activity_repo::record(&self.db, Some(job_id), action, description, details)?;
        Ok(())
    }

    /// 按 `workflow_step` 分派；部分步骤改写为 SEARCH_CONNECTIONS 后继续循环
    async fn advance(
        &self,
        job: &mut Job,
        company: &str,
        template: &Template,
        options: &WorkflowOptions,
        result: &mut WorkflowResult,
    ) -> Result<Transition, WorkflowError> {
        loop {
            match job.workflow_step {
                WorkflowStep::Done => {
                    warn!("[任务 {}] 工作流已完成，无需运行", job.id);
                    result.step("already_done");
                    result.success = true;
                    return Ok(Transition::to(WorkflowStep::Done, JobStatus::Completed));
                }
                WorkflowStep::NeedsHebrewNames => {
                    job.pending_hebrew_names.clear();
                    return self.reach_out(job, company, template, options, Phase::Resume, result).await;
                }
                WorkflowStep::WaitingForReply => {
                    if options.force_search {
                        info!("[任务 {}] 重新搜索联系人", job.id);
                        job.workflow_step = WorkflowStep::SearchConnections;
                        continue;
                    }
                    let awaiting = contact_repo::awaiting_reply(&self.db, job.id)?;
                    return self.check_replies(job, &awaiting, result).await;
                }
                WorkflowStep::WaitingForAccept => {
                    job.workflow_step = WorkflowStep::SearchConnections;
                    continue;
                }
                WorkflowStep::MessageConnections | WorkflowStep::SearchLinkedin | WorkflowStep::SendRequests => {
                    warn!("[任务 {}] 上次在 {} 中断，重新搜索", job.id, job.workflow_step);
                    job.workflow_step = WorkflowStep::SearchConnections;
                    continue;
                }
                WorkflowStep::CompanyExtraction | WorkflowStep::SearchConnections => {
                    return self.reach_out(job, company, template, options, Phase::Search, result).await;
                }
            }
        }
    }

    /// 逐级扩展搜索，并把结果映射为下一状态
    async fn reach_out(
        &self,
        job: &mut Job,
        company: &str,
        template: &Template,
        options: &WorkflowOptions,
        phase: Phase,
        result: &mut WorkflowResult,
    ) -> Result<Transition, WorkflowError> {
        result.step(phase.label());
        job.workflow_step = phase.working_step();
        job_repo::update(&self.db, job)?;

        let contacts = contact_repo::list_for_job(&self.db, job.id)?;
        let already_messaged = urls_where(&contacts, |c| c.message_sent_at.is_some());
        let already_requested = urls_where(&contacts, |c| c.connection_requested_at.is_some());

        let composer = MessageComposer::new(template, company, self.names.as_ref());
        let request = SearchRequest {
            company,
            composer: &composer,
            already_messaged: &already_messaged,
            already_requested: &already_requested,
            first_degree_only: options.first_degree_only,
        };
        let search = DegreeSearch::new(self.surface.as_ref(), &self.session, &self.settings, job.id);

        self.record(
            job.id,
            ActionType::ConnectionSearch,
            &format!("Searching connections at {}", company),
            Some(json!({ "company": company, "first_degree_only": options.first_degree_only })),
        )?;

        let mut report = SearchReport::default();
        let outcome = search.run(&request, &mut report).await;

        // 已发生的动作无论结果如何都要落库
        self.save_contacts(job.id, company, &report)?;
        result.connections_found = report.first_degree.len();
        result.messages_sent = report.messages_sent.len();
        result.connection_requests_sent = report.connection_requests_sent();

        if let SearchOutcome::NeedsTranslation(names) = outcome? {
            return self.pause_for_translation(job, names, result);
        }

        if !report.messages_sent.is_empty() {
            result.step("messages_sent");
            result.success = true;
            return Ok(Transition::to(WorkflowStep::WaitingForReply, JobStatus::Completed));
        }

        if report.connection_requests_sent() > 0 {
            result.step("connection_requests_sent");
            result.success = true;
            return Ok(Transition::to(WorkflowStep::WaitingForAccept, JobStatus::Completed));
        }

        if options.first_degree_only {
            result.step("checked_accepts_none_yet");
            result.success = true;
            job.last_reply_check_at = Some(Utc::now());
            return Ok(Transition::to(WorkflowStep::WaitingForAccept, JobStatus::Completed));
        }

        let message = match phase {
            Phase::Resume => "Could not send any messages or connection requests".to_string(),
            Phase::Search if !report.first_degree.is_empty() => format!(
                "All {} 1st degree contacts already messaged, no new contacts found",
                report.first_degree.len()
            ),
            Phase::Search => format!("Could not find any people at '{}' on LinkedIn", company),
        };
        warn!("[任务 {}] {}", job.id, message);
        self.record(job.id, ActionType::Error, &message, Some(json!({ "company": company })))?;
        result.fail(message.clone());
        Ok(Transition::failed(WorkflowStep::Done, message))
    }

    fn pause_for_translation(
        &self,
        job: &mut Job,
        names: Vec<String>,
        result: &mut WorkflowResult,
    ) -> Result<Transition, WorkflowError> {
        let joined = names.join(", ");
        info!("[任务 {}] ⏸️ 等待用户提供希伯来文名字: {}", job.id, joined);
        self.record(
            job.id,
            ActionType::CompanyInputNeeded,
            &format!("Hebrew name translation needed for: {}", joined),
            Some(json!({ "names": names })),
        )?;
        job.pending_hebrew_names = names.clone();
        result.step("needs_hebrew_names");
        result.needs_hebrew_names = Some(names);
        result.success = true;
        Ok(Transition::to(WorkflowStep::NeedsHebrewNames, JobStatus::NeedsInput))
    }

    /// 检查已发消息的联系人是否回复
    async fn check_replies(
        &self,
        job: &mut Job,
        awaiting: &[Contact],
        result: &mut WorkflowResult,
    ) -> Result<Transition, WorkflowError> {
        result.step("check_replies");
        if awaiting.is_empty() {
            info!("[任务 {}] 没有等待回复的联系人", job.id);
            job.last_reply_check_at = Some(Utc::now());
            result.step("checked_replies_none_yet");
            result.success = true;
            return Ok(Transition::to(WorkflowStep::WaitingForReply, JobStatus::Completed));
        }

        let probes: Vec<ReplyProbe> = awaiting
            .iter()
            .map(|c| ReplyProbe {
                name: c.name.clone(),
                linkedin_url: c.linkedin_url.clone(),
            })
            .collect();

        self.session.check_abort()?;
        let check = self.surface.check_replies(&probes).await?;
        let now = Utc::now();
        job.last_reply_check_at = Some(now);

        let mut replied = 0;
        for contact in awaiting.iter().filter(|c| check.replied.contains(&c.linkedin_url)) {
            if contact_repo::mark_reply_received(&self.db, contact.id, now)? {
                replied += 1;
                info!("[任务 {}] 💬 收到 {} 的回复", job.id, contact.name);
                self.record(
                    job.id,
                    ActionType::ReplyReceived,
                    &format!("Received reply from {}!", contact.name),
                    Some(json!({ "contact_id": contact.id, "linkedin_url": contact.linkedin_url })),
                )?;
            }
        }

        if replied > 0 {
            job.processed_at = Some(now);
            result.step("reply_received");
            result.success = true;
            return Ok(Transition::to(WorkflowStep::Done, JobStatus::Completed));
        }

        if !check.failed.is_empty() {
            let message = format!(
                "Could not check replies from: {}. LinkedIn was unresponsive. Please try again.",
                check.failed.join(", ")
            );
            warn!("[任务 {}] {}", job.id, message);
            result.step("check_replies_failed");
            result.check_failed = Some(check.failed);
            result.fail(message.clone());
            return Ok(Transition::to(WorkflowStep::WaitingForReply, JobStatus::Completed).with_error(message));
        }

        result.step("checked_replies_none_yet");
        result.success = true;
        Ok(Transition::to(WorkflowStep::WaitingForReply, JobStatus::Completed))
    }

    /// 保存 1 度人脉与好友请求对象，并写入发送记录（每个时间戳只写一次）
    fn save_contacts(&self, job_id: i64, company: &str, report: &SearchReport) -> Result<(), WorkflowError> {
        let now = Utc::now();

        for person in &report.first_degree {
            let Some(contact) = self.upsert_contact(job_id, company, person, true)? else {
                continue;
            };
            if !contact.is_connection {
                contact_repo::mark_connected(&self.db, contact.id)?;
                self.record(
                    job_id,
                    ActionType::ConnectionFound,
                    &format!("{} accepted the connection request", person.name),
                    Some(json!({ "contact_id": contact.id })),
                )?;
            }
        }

        for sent in &report.messages_sent {
            let Some(contact) = self.upsert_contact(job_id, company, &sent.person, true)? else {
                continue;
            };
            if contact_repo::mark_message_sent(&self.db, contact.id, Some(&sent.text), now)? {
                self.record(
                    job_id,
                    ActionType::MessageSent,
                    &format!("Sent message to {}", sent.person.name),
                    Some(json!({ "contact_id": contact.id, "message": sent.text })),
                )?;
            }
        }

        if report.connection_requests_sent() > 0 {
            self.record(
                job_id,
                ActionType::LinkedinSearch,
                &format!("Searched LinkedIn for people at {}", company),
                Some(json!({
                    "second_degree": report.second_degree_requests.len(),
                    "third_plus": report.third_plus_requests.len(),
                })),
            )?;
        }

        for person in report.requested() {
            let Some(contact) = self.upsert_contact(job_id, company, person, false)? else {
                continue;
            };
            if contact_repo::mark_connection_requested(&self.db, contact.id, now)? {
                self.record(
                    job_id,
                    ActionType::ConnectionRequestSent,
                    &format!("Sent connection request to {} ({})", person.name, person.degree.label()),
                    Some(json!({ "contact_id": contact.id, "degree": person.degree.label() })),
                )?;
            }
        }
        Ok(())
    }

    /// 按 (linkedin_url, job_id) 查找或新建联系人；新建的 1 度人脉记一条 CONNECTION_FOUND
    fn upsert_contact(
        &self,
        job_id: i64,
        company: &str,
        person: &Person,
        is_connection: bool,
    ) -> Result<Option<Contact>, WorkflowError> {
        let Some(url) = person.linkedin_url.as_deref() else {
            return Ok(None);
        };
        if let Some(existing) = contact_repo::find_for_job(&self.db, job_id, url)? {
            return Ok(Some(existing));
        }

        let contact = contact_repo::insert(
            &self.db,
            &NewContact {
                job_id,
                name: person.name.clone(),
                linkedin_url: url.to_string(),
                company: Some(company.to_string()),
                position: Some(person.headline.clone()).filter(|h| !h.is_empty()),
                is_connection,
                gender: self.names.detect_gender(&person.name),
            },
        )?;
        if is_connection {
            self.record(
                job_id,
                ActionType::ConnectionFound,
                &format!("Found connection: {}", person.name),
                Some(json!({ "contact_id": contact.id, "position": person.headline })),
            )?;
        }
        Ok(Some(contact))
    }
}

fn urls_where(contacts: &[Contact], predicate: impl Fn(&Contact) -> bool) -> HashSet<String> {
    contacts
        .iter()
        .filter(|c| predicate(c))
        .map(|c| c.linkedin_url.clone())
        .collect()
}
