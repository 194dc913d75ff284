//! 浏览器自动化接口
//!
//! 编排层只通过这几个操作接触 LinkedIn 页面（搜索、发消息、加好友、查回复）。
//! 实现方负责元素查找的重试与退避；所有等待都应当可被中止。

use async_trait::async_trait;
use serde::Serialize;

use crate::error::AutomationError;
use crate::models::{Degree, Person};

/// 好友请求结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectOutcome {
    Sent,
    /// 个人页上没有 Connect 按钮（已发送过、已是好友或受限）
    NoConnectButton,
    /// LinkedIn 要求填写对方邮箱才能发送
    EmailVerificationRequired,
    Failed,
}

impl ConnectOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, ConnectOutcome::Sent)
    }
}

/// 需要检查回复的联系人
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyProbe {
    pub name: String,
    pub linkedin_url: String,
}

/// 回复检查结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyCheck {
    /// 已回复者的 linkedin_url
    pub replied: Vec<String>,
    /// 无法检查的联系人姓名
    pub failed: Vec<String>,
}

#[async_trait]
pub trait BrowserAutomationSurface: Send + Sync {
    /// 搜索在 `company` 工作、距离为 `degree` 的人（`page` 从 1 开始）
    async fn search_people(&self, company: &str, degree: Degree, page: u32) -> Result<Vec<Person>, AutomationError>;

    /// 与此人是否已有聊天记录
    async fn has_conversation_history(&self, person: &Person) -> Result<bool, AutomationError>;

    /// 发送消息；没有 Message 按钮时返回 `false`
    async fn send_message(&self, person: &Person, text: &str) -> Result<bool, AutomationError>;

    async fn send_connection_request(&self, person: &Person, note: Option<&str>) -> Result<ConnectOutcome, AutomationError>;

    async fn check_replies(&self, contacts: &[ReplyProbe]) -> Result<ReplyCheck, AutomationError>;
}
