//! 业务能力层：只处理单个任务 / 单个名字，不知道流程
//!
//! - `job_parser`：链接 → 域名 → 公司名
//! - `JobProcessor`：公司名解析与站点规则学习
//! - `NameDirectory`：性别识别与希伯来文名字翻译

pub mod job_parser;
pub mod job_processor;
pub mod names;

pub use job_processor::{Extraction, JobProcessor};
pub use names::{is_hebrew_text, NameDirectory, NameResolution};
