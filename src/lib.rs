//! # LinkedIn Outreach
//!
//! 为投递的职位链接寻找目标公司的 LinkedIn 联系人，并自动发消息 / 好友请求
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源，只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//! - `SessionCoordinator` - 浏览器所有权、FIFO 队列、协作式中止
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个任务或名字
//! - `JobProcessor` - 从职位链接解析公司名，学习站点规则
//! - `NameDirectory` - 性别判断与希伯来文译名
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个任务"的联系流程
//! - `DegreeSearch` - 1 度消息 → 2 度 → 3 度好友请求
//! - `MessageComposer` - 渲染模板，缺少译名时返回 `NeedsTranslation`
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/workflow_orchestrator` - 持久化的状态机，每次推进一个阶段
//! - `orchestrator/job_runner` - 入队、后台运行、定时回复检查
//!
//! 另有 `browser/`（chromiumoxide 上的 LinkedIn 自动化）、`db/`（SQLite）和 `api/`（axum）。
//!
//! ## 模块结构

pub mod api;
pub mod app;
pub mod browser;
pub mod config;
pub mod db;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use db::Database;
pub use error::{AppError, AppResult, AutomationError, WorkflowError};
pub use infrastructure::SessionCoordinator;
pub use orchestrator::{JobRunner, WorkflowOptions, WorkflowOrchestrator, WorkflowResult};
