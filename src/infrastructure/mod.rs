//! 基础设施层：持有稀缺资源，只暴露能力
//!
//! - `JsExecutor`：唯一的 page owner
//! - `SessionCoordinator`：唯一的浏览器会话、等待队列与中止标志
//! - `sleep_checking`：可中断等待

pub mod js_executor;
pub mod session;
pub mod wait;

pub use js_executor::JsExecutor;
pub use session::{AbortAllReport, AbortOutcome, SessionCoordinator, SessionGuard, SessionSnapshot};
pub use wait::{sleep_checking, WaitOutcome};
