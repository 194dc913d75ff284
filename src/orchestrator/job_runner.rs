//! 后台任务调度 - 编排层
//!
//! HTTP 请求只负责入队并立即返回，真正的工作由这里 `tokio::spawn` 出去。
//! 所有浏览器工作都经过同一个 `SessionCoordinator`，因此并发提交的任务会按 FIFO 串行执行。

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::workflow_orchestrator::{WorkflowOptions, WorkflowOrchestrator, WorkflowResult};
use crate::db::{activity_repo, job_repo, Database, DatabaseError};
use crate::error::WorkflowError;
use crate::models::{ActionType, JobStatus};
use crate::services::{Extraction, JobProcessor};

/// 后台任务调度器（可廉价克隆）
#[derive(Clone)]
pub struct JobRunner {
    db: Database,
    orchestrator: Arc<WorkflowOrchestrator>,
    processor: Arc<JobProcessor>,
}

impl JobRunner {
    pub fn new(db: Database, orchestrator: Arc<WorkflowOrchestrator>) -> Self {
        let processor = Arc::new(JobProcessor::new(db.clone()));
        Self {
            db,
            orchestrator,
            processor,
        }
    }

    pub fn orchestrator(&self) -> &Arc<WorkflowOrchestrator> {
        &self.orchestrator
    }

    pub fn processor(&self) -> &Arc<JobProcessor> {
        &self.processor
    }

    /// 放入浏览器队列并在后台运行一次工作流
    ///
    /// # 参数
    /// - `job_id`: 任务 ID
    /// - `options`: 工作流选项
    ///
    /// # 返回
    /// 返回后台任务句柄；工作流出错时句柄结果为 `None`（错误已记录日志）
    pub fn submit(&self, job_id: i64, options: WorkflowOptions) -> JoinHandle<Option<WorkflowResult>> {
        self.orchestrator.session().enqueue(job_id);
        let orchestrator = self.orchestrator.clone();
        tokio::spawn(async move {
            match orchestrator.run_workflow(job_id, &options).await {
                Ok(result) => {
                    if result.aborted {
                        info!("[任务 {}] ⏹️ 工作流已中止", job_id);
                    } else if let Some(e) = &result.error {
                        warn!("[任务 {}] ⚠️ {}", job_id, e);
                    } else {
                        info!(
                            "[任务 {}] ✅ 消息 {}，好友请求 {}",
                            job_id, result.messages_sent, result.connection_requests_sent
                        );
                    }
                    Some(result)
                }
                Err(e) => {
                    error!("[任务 {}] ❌ 工作流无法运行: {}", job_id, e);
                    None
                }
            }
        })
    }

    /// 在后台提取公司名（只访问数据库，不占用浏览器）
    ///
    /// # 参数
    /// - `job_id`: 任务 ID
    ///
    /// # 返回
    /// 返回后台任务句柄，结果为提取结论；出错时为 `None`
    pub fn spawn_extraction(&self, job_id: i64) -> JoinHandle<Option<Extraction>> {
        let processor = self.processor.clone();
        tokio::task::spawn_blocking(move || match processor.process_job(job_id) {
            Ok(extraction) => Some(extraction),
            Err(e) => {
                error!("[任务 {}] ❌ 公司名提取失败: {}", job_id, e);
                None
            }
        })
    }

    /// 为到期的 WAITING_FOR_REPLY 任务安排回复检查，返回已安排的任务 id
    ///
    /// # 参数
    /// - `interval`: 两次检查之间的最短间隔
    ///
    /// # 返回
    /// 返回本轮安排了检查的任务 ID（已在队列或正在运行的任务会跳过）
    pub fn schedule_reply_checks(&self, interval: chrono::Duration) -> Result<Vec<i64>, WorkflowError> {
        let cutoff = Utc::now() - interval;
        let due = job_repo::find_due_reply_checks(&self.db, cutoff)?;
        let mut scheduled = Vec::with_capacity(due.len());
        for job in due {
            if self.orchestrator.session().is_queued(job.id)
                || self.orchestrator.session().current_job() == Some(job.id)
            {
                continue;
            }
            info!("[任务 {}] 📬 安排回复检查", job.id);
            self.submit(job.id, WorkflowOptions::default());
            scheduled.push(job.id);
        }
        Ok(scheduled)
    }

    /// 周期性地安排回复检查，直到进程退出
    pub fn start_reply_check_loop(&self, every: Duration, interval: chrono::Duration) -> JoinHandle<()> {
        let runner = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                match runner.schedule_reply_checks(interval) {
                    Ok(ids) if !ids.is_empty() => info!("📬 已安排 {} 个回复检查: {:?}", ids.len(), ids),
                    Ok(_) => {}
                    Err(e) => error!("❌ 安排回复检查失败: {}", e),
                }
            }
        })
    }
}

/// 把上次进程退出时仍为 PROCESSING 的任务标为 FAILED，返回处理数量
///
/// # 参数
/// - `db`: 数据库
///
/// # 返回
/// 返回被标为 FAILED 的任务数量
pub fn recover_interrupted(db: &Database) -> Result<usize, DatabaseError> {
    let stuck = job_repo::find_by_status(db, JobStatus::Processing)?;
    for mut job in stuck.iter().cloned() {
        warn!("[任务 {}] 上次运行未完成（步骤 {}），标记为失败", job.id, job.workflow_step);
        job.status = JobStatus::Failed;
        job.error_message = Some("Interrupted before completion".to_string());
        job_repo::update(db, &job)?;
        activity_repo::record(
            db,
            Some(job.id),
            ActionType::Error,
            "Interrupted before completion",
            Some(serde_json::json!({ "workflow_step": job.workflow_step.as_str() })),
        )?;
    }
    Ok(stuck.len())
}
