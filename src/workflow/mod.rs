//! 流程层：一个任务的外联协议
//!
//! - `DegreeSearch`：1 度 → 2 度 → 3 度逐级扩展
//! - `MessageComposer`：按性别选模板、渲染占位符
//! - `vip`：高管过滤

pub mod message;
pub mod search;
pub mod vip;

pub use message::{MessageComposer, MessageDraft};
pub use search::{DegreeSearch, SearchOutcome, SearchReport, SearchRequest, SearchSettings, SentMessage};
pub use vip::is_vip;
