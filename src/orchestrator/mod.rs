//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层决定"什么时候做什么"，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `workflow_orchestrator` - 单个任务的状态机
//! - 通过 `SessionCoordinator` 独占浏览器
//! - 按持久化的 `workflow_step` 推进一个阶段
//! - 中止时恢复调用前状态，失败时记为 FAILED
//!
//! ### `job_runner` - 后台调度
//! - 入队并 `tokio::spawn` 工作流
//! - 后台提取公司名
//! - 定时安排回复检查、启动时恢复中断的任务
//!
//! ## 层次关系
//!
//! ```text
//! api (HTTP 入口)
//!     ↓
//! job_runner (入队 + 后台运行)
//!     ↓
//! workflow_orchestrator (处理单个 Job)
//!     ↓
//! workflow::DegreeSearch (逐级扩展搜索)
//!     ↓
//! browser::BrowserAutomationSurface / services
//!     ↓
//! infrastructure (SessionCoordinator / JsExecutor)
//! ```

pub mod job_runner;
pub mod workflow_orchestrator;

pub use job_runner::{recover_interrupted, JobRunner};
pub use workflow_orchestrator::{WorkflowOptions, WorkflowOrchestrator, WorkflowResult};
