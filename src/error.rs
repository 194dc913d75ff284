//! 错误类型
//!
//! - `AutomationError`：浏览器自动化层（可被协作式中止打断）
//! - `WorkflowError`：工作流边界上的错误分类
//! - `AppError`：启动与装配阶段的错误

use thiserror::Error;

use crate::db::DatabaseError;

/// 浏览器自动化错误
#[derive(Debug, Error)]
pub enum AutomationError {
    /// 用户请求中止（协作式）
    #[error("Workflow aborted by user")]
    Aborted,

    /// 重试后仍未找到页面元素
    #[error("Element not found after {attempts} attempts: {what}")]
    ElementNotFound { what: String, attempts: usize },

    /// 页面导航失败
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// CDP / 页面脚本执行失败
    #[error("Browser script failed: {0}")]
    Script(String),

    /// LinkedIn 会话未登录
    #[error("LinkedIn session is not logged in")]
    NotLoggedIn,
}

impl AutomationError {
    pub fn is_aborted(&self) -> bool {
        matches!(self, AutomationError::Aborted)
    }
}

impl From<chromiumoxide::error::CdpError> for AutomationError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AutomationError::Script(err.to_string())
    }
}

impl From<serde_json::Error> for AutomationError {
    fn from(err: serde_json::Error) -> Self {
        AutomationError::Script(format!("unexpected script result: {}", err))
    }
}

/// 工作流错误
///
/// 只有 `Aborted` 是可逆的控制路径，其余错误在编排层统一落为 FAILED。
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Workflow aborted by user")]
    Aborted,

    #[error("Job {0} not found")]
    JobNotFound(i64),

    /// 前置条件不满足（未提取公司名、没有模板），不触碰浏览器和任务状态
    #[error("{0}")]
    Precondition(String),

    #[error(transparent)]
    Automation(AutomationError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<AutomationError> for WorkflowError {
    fn from(err: AutomationError) -> Self {
        match err {
            AutomationError::Aborted => WorkflowError::Aborted,
            other => WorkflowError::Automation(other),
        }
    }
}

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("浏览器错误: {0}")]
    Browser(String),

    #[error("数据库错误: {0}")]
    Database(#[from] DatabaseError),

    #[error("工作流错误: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aborted_automation_maps_to_aborted_workflow() {
        let err: WorkflowError = AutomationError::Aborted.into();
        assert!(matches!(err, WorkflowError::Aborted));
    }

    #[test]
    fn other_automation_errors_keep_their_message() {
        let err: WorkflowError = AutomationError::ElementNotFound {
            what: "search input".to_string(),
            attempts: 4,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Element not found after 4 attempts: search input"
        );
    }
}
