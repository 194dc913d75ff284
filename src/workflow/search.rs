//! 逐级扩展的人脉搜索
//!
//! 1. 搜索 1 度人脉，只给第一个符合条件的人发一条消息，然后停下等回复
//! 2. 没有发出消息时，向 2 度人脉发好友请求（单次运行上限 `max_connection_requests`）
//! 3. 2 度不足上限时，用 3 度及以上补足
//!
//! 每个人之间都有可中断的间隔，中止请求在下一个检查点生效。

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, info};

use super::message::{MessageComposer, MessageDraft};
use super::vip::is_vip;
use crate::browser::BrowserAutomationSurface;
use crate::config::Config;
use crate::error::AutomationError;
use crate::infrastructure::SessionCoordinator;
use crate::models::{Degree, Person};
use crate::utils::truncate_text;

/// 搜索参数
#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// 每次搜索保留的人数上限
    pub search_limit: usize,
    pub max_connection_requests: usize,
    pub max_search_pages: u32,
    /// 两次页面动作之间的间隔
    pub action_delay: Duration,
}

impl SearchSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            search_limit: config.search_limit,
            max_connection_requests: config.max_connection_requests,
            max_search_pages: config.max_search_pages,
            action_delay: config.action_delay(),
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// 一次搜索的输入
pub struct SearchRequest<'a> {
    pub company: &'a str,
    pub composer: &'a MessageComposer<'a>,
    /// 本任务已发过消息的人（linkedin_url）
    pub already_messaged: &'a HashSet<String>,
    /// 本任务已发过好友请求的人（linkedin_url）
    pub already_requested: &'a HashSet<String>,
    /// 只检查 1 度人脉（查看好友请求是否已被接受），不扩展
    pub first_degree_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub person: Person,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchReport {
    /// 在目标公司的 1 度人脉
    pub first_degree: Vec<Person>,
    pub messages_sent: Vec<SentMessage>,
    pub second_degree_requests: Vec<Person>,
    pub third_plus_requests: Vec<Person>,
}

impl SearchReport {
    pub fn connection_requests_sent(&self) -> usize {
        self.second_degree_requests.len() + self.third_plus_requests.len()
    }

    pub fn requested(&self) -> impl Iterator<Item = &Person> {
        self.second_degree_requests
            .iter()
            .chain(self.third_plus_requests.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Completed,
    /// 生成消息时缺少希伯来文译名
    NeedsTranslation(Vec<String>),
}

pub struct DegreeSearch<'a> {
    surface: &'a dyn BrowserAutomationSurface,
    session: &'a SessionCoordinator,
    settings: &'a SearchSettings,
    job_id: i64,
}

impl<'a> DegreeSearch<'a> {
    pub fn new(
        surface: &'a dyn BrowserAutomationSurface,
        session: &'a SessionCoordinator,
        settings: &'a SearchSettings,
        job_id: i64,
    ) -> Self {
        Self {
            surface,
            session,
            settings,
            job_id,
        }
    }

    /// 进度随时写入 `report`，出错或中止时调用方仍可据此记录已发生的动作
    ///
    /// # 参数
    /// - `request`: 公司、消息模板与已联系过的人
    /// - `report`: 进度输出
    ///
    /// # 返回
    /// 返回搜索结论；缺少译名时为 `NeedsTranslation`
    pub async fn run(&self, request: &SearchRequest<'_>, report: &mut SearchReport) -> Result<SearchOutcome, AutomationError> {
        // ========== 1 度人脉 ==========
        self.session.check_abort()?;
        let first_degree: Vec<Person> = self
            .surface
            .search_people(request.company, Degree::First, 1)
            .await?
            .into_iter()
            .filter(|p| p.linkedin_url.is_some() && p.works_at(request.company))
            .take(self.settings.search_limit)
            .collect();
        info!(
            "[任务 {}] 在 {} 找到 {} 个 1 度人脉",
            self.job_id,
            request.company,
            first_degree.len()
        );
        report.first_degree = first_degree.clone();

        for person in &first_degree {
            self.session.check_abort()?;
            if is_vip(&person.headline) {
                debug!("[任务 {}] 跳过高管: {} ({})", self.job_id, person.name, person.headline);
                continue;
            }
            if contains(request.already_messaged, person) {
                continue;
            }
            if self.surface.has_conversation_history(person).await? {
                debug!("[任务 {}] 已有聊天记录，跳过: {}", self.job_id, person.name);
                self.session.pause(self.settings.action_delay).await?;
                continue;
            }

            let text = match request.composer.compose(person) {
                MessageDraft::Ready(text) => text,
                MessageDraft::NeedsTranslation(names) => {
                    info!("[任务 {}] ⏸️ 缺少译名: {:?}", self.job_id, names);
                    return Ok(SearchOutcome::NeedsTranslation(names));
                }
            };

            self.session.check_abort()?;
            if self.surface.send_message(person, &text).await? {
                info!("[任务 {}] ✉️ 已发消息给 {}: {}", self.job_id, person.name, truncate_text(&text, 40));
                report.messages_sent.push(SentMessage {
                    person: person.clone(),
                    text,
                });
                // 每轮只发一条，等回复后再联系下一个人
                break;
            }
            self.session.pause(self.settings.action_delay).await?;
        }

        if !report.messages_sent.is_empty() || request.first_degree_only {
            return Ok(SearchOutcome::Completed);
        }

        // ========== 2 度 → 3 度 ==========
        let cap = self.settings.max_connection_requests;
        self.request_connections(request, Degree::Second, cap, &mut report.second_degree_requests)
            .await?;
        let remaining = cap.saturating_sub(report.second_degree_requests.len());
        if remaining > 0 {
            self.request_connections(request, Degree::ThirdPlus, remaining, &mut report.third_plus_requests)
                .await?;
        }

        info!(
            "[任务 {}] 好友请求: 2 度 {}，3 度+ {}",
            self.job_id,
            report.second_degree_requests.len(),
            report.third_plus_requests.len()
        );
        Ok(SearchOutcome::Completed)
    }

    /// 逐页搜索并发送好友请求，最多 `limit` 个
    async fn request_connections(
        &self,
        request: &SearchRequest<'_>,
        degree: Degree,
        limit: usize,
        sent: &mut Vec<Person>,
    ) -> Result<(), AutomationError> {
        let mut seen: HashSet<String> = HashSet::new();

        for page in 1..=self.settings.max_search_pages {
            if sent.len() >= limit {
                break;
            }
            self.session.check_abort()?;
            let people = self.surface.search_people(request.company, degree, page).await?;
            if people.is_empty() {
                break;
            }

            for person in people {
                if sent.len() >= limit {
                    break;
                }
                let Some(url) = person.linkedin_url.clone() else {
                    continue;
                };
                if !seen.insert(url) {
                    continue;
                }
                if is_vip(&person.headline) {
                    debug!("[任务 {}] 跳过高管: {} ({})", self.job_id, person.name, person.headline);
                    continue;
                }
                if contains(request.already_requested, &person) || contains(request.already_messaged, &person) {
                    continue;
                }

                self.session.check_abort()?;
                let outcome = self.surface.send_connection_request(&person, None).await?;
                if outcome.is_sent() {
                    info!("[任务 {}] 🤝 {} 度: {}", self.job_id, degree.label(), person.name);
                    sent.push(person);
                } else {
                    debug!("[任务 {}] 未能发送好友请求给 {}: {:?}", self.job_id, person.name, outcome);
                }
                self.session.pause(self.settings.action_delay).await?;
            }
        }
        Ok(())
    }
}

fn contains(urls: &HashSet<String>, person: &Person) -> bool {
    person
        .linkedin_url
        .as_ref()
        .is_some_and(|url| urls.contains(url))
}
