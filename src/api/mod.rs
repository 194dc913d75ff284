//! API 模块
//!
//! 负责与前端的交互：axum 路由 + 服务层，只做校验、入队与读模型

pub mod error;
pub mod routes;
pub mod service;

// 重新导出常用类型
pub use error::{ApiError, ApiResult};
pub use routes::router;
pub use service::{HebrewNameInput, JobService, WorkflowQueued};
