//! 应用装配 - 依赖注入根
//!
//! 打开数据库、恢复中断的任务、连接浏览器，构造唯一的 `SessionCoordinator`
//! 并注入到编排层与自动化层，最后启动 HTTP 服务和定时回复检查。

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chromiumoxide::Browser;
use tokio::net::TcpListener;
use tracing::info;

use crate::api::{self, JobService};
use crate::browser::{self, BrowserAutomationSurface, LinkedInSurface};
use crate::config::Config;
use crate::db::Database;
use crate::infrastructure::{JsExecutor, SessionCoordinator};
use crate::orchestrator::{recover_interrupted, JobRunner, WorkflowOrchestrator};
use crate::services::{NameDirectory, NameResolution};
use crate::utils::logging;
use crate::workflow::SearchSettings;

/// 定时任务检查间隔（是否有到期的回复检查）
const REPLY_CHECK_TICK: Duration = Duration::from_secs(15 * 60);

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    service: JobService,
    runner: JobRunner,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::log_startup(&config);

        let db = Database::open(&config.database_path)?;
        logging::log_recovery(recover_interrupted(&db)?);

        let names = Arc::new(NameDirectory::load(db.clone())?);

        // 连接浏览器
        let (browser, page) = browser::open_browser(&config).await?;

        // 进程内唯一的浏览器会话协调器
        let session = Arc::new(SessionCoordinator::from_config(&config));
        let surface: Arc<dyn BrowserAutomationSurface> = Arc::new(LinkedInSurface::new(
            JsExecutor::new(page),
            session.clone(),
            config.action_delay(),
        ));
        let resolver: Arc<dyn NameResolution> = names.clone();

        let orchestrator = Arc::new(WorkflowOrchestrator::new(
            db.clone(),
            session,
            surface,
            resolver,
            SearchSettings::from_config(&config),
        ));
        let runner = JobRunner::new(db.clone(), orchestrator);
        let service = JobService::new(db, runner.clone(), names);

        Ok(Self {
            config,
            _browser: browser,
            service,
            runner,
        })
    }

    /// 启动定时回复检查并提供 HTTP 服务，直到进程退出
    pub async fn run(self) -> Result<()> {
        self.runner
            .start_reply_check_loop(REPLY_CHECK_TICK, self.config.reply_check_interval());
        logging::log_session(&self.service.current_session());

        let listener = TcpListener::bind(self.config.bind_addr).await?;
        info!("✓ HTTP 服务已启动: http://{}", self.config.bind_addr);
        axum::serve(listener, api::router(self.service)).await?;
        Ok(())
    }
}
