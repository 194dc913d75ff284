//! LinkedIn 页面自动化（chromiumoxide 实现）
//!
//! 所有 DOM 操作都是页内 JS，通过 `JsExecutor` 执行。
//! 元素查找按 [`RETRY_DELAYS_MS`] 渐进退避，等待均经由 `SessionCoordinator::pause`，可被中止。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};
use url::Url;

use super::surface::{BrowserAutomationSurface, ConnectOutcome, ReplyCheck, ReplyProbe};
use crate::error::AutomationError;
use crate::infrastructure::{JsExecutor, SessionCoordinator};
use crate::models::{Degree, Person};

/// 元素查找的退避间隔
const RETRY_DELAYS_MS: [u64; 4] = [200, 500, 1500, 2000];

const SEARCH_BASE_URL: &str = "https://www.linkedin.com/search/results/people/";

const SEARCH_RESULTS_JS: &str = r#"
(() => {
    const path = location.pathname;
    if (path.startsWith('/login') || path.startsWith('/authwall') || path.startsWith('/checkpoint')) {
        return { state: 'logged_out', people: [] };
    }
    const cards = Array.from(document.querySelectorAll(
        'li.reusable-search__result-container, div[data-chameleon-result-urn], div[data-view-name="search-entity-result-universal-template"]'
    ));
    if (!cards.length) {
        const empty = document.querySelector('.search-reusable-search-no-results, .artdeco-empty-state');
        return { state: empty ? 'empty' : 'loading', people: [] };
    }
    const people = cards.map(card => {
        const link = card.querySelector('a[href*="/in/"]');
        const nameEl = card.querySelector('.entity-result__title-text span[aria-hidden="true"], a[href*="/in/"] span[aria-hidden="true"]');
        const headlineEl = card.querySelector('.entity-result__primary-subtitle, div.t-14.t-black.t-normal');
        if (!link || !nameEl) return null;
        return {
            name: nameEl.innerText.trim(),
            headline: headlineEl ? headlineEl.innerText.trim() : '',
            linkedin_url: link.href.split('?')[0],
        };
    }).filter(p => p && p.name && p.name !== 'LinkedIn Member');
    return { state: 'results', people };
})()
"#;

const PROFILE_ACTIONS_JS: &str = r#"
(() => {
    const main = document.querySelector('main');
    if (!main || !main.querySelector('h1')) return null;
    const label = el => ((el.getAttribute('aria-label') || '') + ' ' + (el.innerText || '')).toLowerCase();
    const buttons = Array.from(main.querySelectorAll('button, a[role="button"]'));
    return {
        has_message: buttons.some(b => /\bmessage\b/.test(label(b))),
        has_connect: buttons.some(b => /\bconnect\b/.test(label(b)) && !/disconnect/.test(label(b))),
        has_more: buttons.some(b => /^\s*more\b/.test(label(b)) || /more actions/.test(label(b))),
    };
})()
"#;

const MESSAGE_THREAD_JS: &str = r#"
(() => {
    const box = document.querySelector('.msg-form__contenteditable');
    if (!box) return null;
    const groups = Array.from(document.querySelectorAll('.msg-s-message-list__event'));
    const senders = groups
        .map(g => g.querySelector('.msg-s-message-group__name, .msg-s-message-group__profile-link'))
        .filter(Boolean)
        .map(n => n.innerText.trim());
    return { event_count: groups.length, senders };
})()
"#;

const SEND_BUTTON_JS: &str = r#"
(() => {
    const btn = document.querySelector('.msg-form__send-button, button.msg-form__send-btn');
    if (!btn || btn.disabled) return null;
    btn.click();
    return true;
})()
"#;

const CONNECT_MODAL_JS: &str = r#"
(() => {
    const modal = document.querySelector('div[role="dialog"]');
    if (!modal) return null;
    const buttons = Array.from(modal.querySelectorAll('button'));
    const text = b => ((b.getAttribute('aria-label') || '') + ' ' + (b.innerText || '')).toLowerCase();
    const send = buttons.find(b => /send/.test(text(b)));
    return {
        email_required: !!modal.querySelector('input[type="email"], input[name="email"]'),
        can_send: !!send && !send.disabled,
        can_add_note: buttons.some(b => /add a note/.test(text(b))),
    };
})()
"#;

const CLOSE_OVERLAYS_JS: &str = r#"
(() => {
    const closers = document.querySelectorAll(
        '.msg-overlay-bubble-header__control--close-btn, div[role="dialog"] button[aria-label="Dismiss"]'
    );
    closers.forEach(b => b.click());
    return closers.length;
})()
"#;

#[derive(Debug, Deserialize)]
struct SearchPage {
    state: String,
    #[serde(default)]
    people: Vec<RawPerson>,
}

#[derive(Debug, Deserialize)]
struct RawPerson {
    name: String,
    #[serde(default)]
    headline: String,
    linkedin_url: String,
}

#[derive(Debug, Deserialize)]
struct ProfileActions {
    has_message: bool,
    has_connect: bool,
    has_more: bool,
}

#[derive(Debug, Deserialize)]
struct MessageThread {
    event_count: usize,
    #[serde(default)]
    senders: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ConnectModal {
    email_required: bool,
    can_send: bool,
    can_add_note: bool,
}

/// LinkedIn 自动化
///
/// 只在持有浏览器会话期间被调用，因此内部不再加锁。
pub struct LinkedInSurface {
    executor: JsExecutor,
    session: Arc<SessionCoordinator>,
    action_delay: Duration,
}

impl LinkedInSurface {
    pub fn new(executor: JsExecutor, session: Arc<SessionCoordinator>, action_delay: Duration) -> Self {
        Self {
            executor,
            session,
            action_delay,
        }
    }

    async fn settle(&self) -> Result<(), AutomationError> {
        self.session.pause(self.action_delay).await
    }

    async fn open(&self, url: &str) -> Result<(), AutomationError> {
        self.session.check_abort()?;
        self.executor.goto(url).await?;
        self.settle().await
    }

    /// 反复执行 `js` 直到返回非 null，失败时按退避间隔等待
    async fn find_with_retry<T: DeserializeOwned>(&self, what: &str, js: &str) -> Result<T, AutomationError> {
        for (attempt, delay_ms) in RETRY_DELAYS_MS.iter().enumerate() {
            self.session.check_abort()?;
            let value: JsonValue = self.executor.eval(js).await?;
            if !value.is_null() {
                return Ok(serde_json::from_value(value)?);
            }
            debug!("未找到 {} (尝试 {}/{})", what, attempt + 1, RETRY_DELAYS_MS.len());
            self.session.pause(Duration::from_millis(*delay_ms)).await?;
        }
        Err(AutomationError::ElementNotFound {
            what: what.to_string(),
            attempts: RETRY_DELAYS_MS.len(),
        })
    }

    /// 点击第一个标签匹配 `pattern`（正则，忽略大小写）的按钮
    async fn click_button(&self, scope: &str, pattern: &str) -> Result<bool, AutomationError> {
        let js = format!(
            r#"
            (() => {{
                const root = document.querySelector({scope}) || document;
                const re = new RegExp({pattern}, 'i');
                const label = el => (el.getAttribute('aria-label') || '') + ' ' + (el.innerText || '');
                const btn = Array.from(root.querySelectorAll('button, a[role="button"], div[role="button"]'))
                    .find(b => re.test(label(b)) && !b.disabled);
                if (!btn) return false;
                btn.click();
                return true;
            }})()
            "#,
            scope = serde_json::to_string(scope)?,
            pattern = serde_json::to_string(pattern)?,
        );
        self.executor.eval_as(js).await
    }

    async fn close_overlays(&self) {
        if let Err(e) = self.executor.eval(CLOSE_OVERLAYS_JS).await {
            warn!("关闭聊天窗口失败: {}", e);
        }
    }

    async fn open_profile(&self, person: &Person) -> Result<ProfileActions, AutomationError> {
        let url = person
            .linkedin_url
            .as_deref()
            .ok_or_else(|| AutomationError::Navigation {
                url: String::new(),
                reason: format!("{} has no profile URL", person.name),
            })?;
        self.open(url).await?;
        self.find_with_retry("profile actions", PROFILE_ACTIONS_JS).await
    }

    /// 打开个人页并进入聊天窗口；没有 Message 按钮时返回 `None`
    async fn open_thread(&self, person: &Person) -> Result<Option<MessageThread>, AutomationError> {
        let actions = self.open_profile(person).await?;
        if !actions.has_message {
            return Ok(None);
        }
        if !self.click_button("main", r"\bmessage\b").await? {
            return Ok(None);
        }
        self.settle().await?;
        let thread = self.find_with_retry("message box", MESSAGE_THREAD_JS).await?;
        Ok(Some(thread))
    }

    async fn type_message(&self, text: &str) -> Result<(), AutomationError> {
        let js = format!(
            r#"
            (() => {{
                const box = document.querySelector('.msg-form__contenteditable');
                if (!box) return null;
                box.focus();
                box.innerHTML = '';
                const p = document.createElement('p');
                p.textContent = {text};
                box.appendChild(p);
                box.dispatchEvent(new InputEvent('input', {{ bubbles: true }}));
                return true;
            }})()
            "#,
            text = serde_json::to_string(text)?,
        );
        let _: bool = self.find_with_retry("message box", &js).await?;
        Ok(())
    }

    async fn check_one_reply(&self, probe: &ReplyProbe) -> Result<bool, AutomationError> {
        let person = Person {
            name: probe.name.clone(),
            headline: String::new(),
            linkedin_url: Some(probe.linkedin_url.clone()),
            degree: Degree::First,
        };
        let thread = self.open_thread(&person).await?;
        self.close_overlays().await;

        let first_name = person.first_name().to_lowercase();
        Ok(thread
            .map(|t| {
                t.senders
                    .iter()
                    .any(|sender| sender.to_lowercase().starts_with(&first_name))
            })
            .unwrap_or(false))
    }
}

#[async_trait]
impl BrowserAutomationSurface for LinkedInSurface {
    async fn search_people(&self, company: &str, degree: Degree, page: u32) -> Result<Vec<Person>, AutomationError> {
        let url = search_url(company, degree, page)?;
        info!("🔍 搜索 {} 的 {} 度人脉（第 {} 页）", company, degree.label(), page);
        self.open(url.as_str()).await?;

        for delay_ms in RETRY_DELAYS_MS {
            self.session.check_abort()?;
            let result: SearchPage = self.executor.eval_as(SEARCH_RESULTS_JS).await?;
            match result.state.as_str() {
                "logged_out" => return Err(AutomationError::NotLoggedIn),
                "empty" => return Ok(Vec::new()),
                "results" => {
                    let people = result
                        .people
                        .into_iter()
                        .map(|raw| Person {
                            name: raw.name,
                            headline: raw.headline,
                            linkedin_url: Some(raw.linkedin_url),
                            degree,
                        })
                        .collect::<Vec<_>>();
                    debug!("第 {} 页找到 {} 人", page, people.len());
                    return Ok(people);
                }
                _ => self.session.pause(Duration::from_millis(delay_ms)).await?,
            }
        }
        Err(AutomationError::ElementNotFound {
            what: "search results".to_string(),
            attempts: RETRY_DELAYS_MS.len(),
        })
    }

    async fn has_conversation_history(&self, person: &Person) -> Result<bool, AutomationError> {
        let thread = self.open_thread(person).await?;
        self.close_overlays().await;
        Ok(thread.map(|t| t.event_count > 0).unwrap_or(false))
    }

    async fn send_message(&self, person: &Person, text: &str) -> Result<bool, AutomationError> {
        if self.open_thread(person).await?.is_none() {
            info!("{} 没有 Message 按钮，跳过", person.name);
            return Ok(false);
        }
        self.session.check_abort()?;
        self.type_message(text).await?;
        self.settle().await?;
        let _: bool = self.find_with_retry("send button", SEND_BUTTON_JS).await?;
        self.settle().await?;
        self.close_overlays().await;
        info!("✉️ 已发送消息给 {}", person.name);
        Ok(true)
    }

    async fn send_connection_request(&self, person: &Person, note: Option<&str>) -> Result<ConnectOutcome, AutomationError> {
        let actions = self.open_profile(person).await?;

        let clicked = if actions.has_connect {
            self.click_button("main", r"\bconnect\b").await?
        } else if actions.has_more {
            // Connect 可能藏在 More 菜单里
            self.click_button("main", r"^\s*more\b|more actions").await?;
            self.settle().await?;
            self.click_button("main", r"\bconnect\b").await?
        } else {
            false
        };
        if !clicked {
            return Ok(ConnectOutcome::NoConnectButton);
        }
        self.settle().await?;

        let modal: ConnectModal = self.find_with_retry("connect dialog", CONNECT_MODAL_JS).await?;
        if modal.email_required {
            warn!("{} 需要邮箱验证，跳过", person.name);
            self.close_overlays().await;
            return Ok(ConnectOutcome::EmailVerificationRequired);
        }

        if let (Some(note), true) = (note, modal.can_add_note) {
            self.click_button("div[role=\"dialog\"]", "add a note").await?;
            self.settle().await?;
            let js = format!(
                r#"
                (() => {{
                    const area = document.querySelector('div[role="dialog"] textarea');
                    if (!area) return null;
                    area.value = {note};
                    area.dispatchEvent(new Event('input', {{ bubbles: true }}));
                    return true;
                }})()
                "#,
                note = serde_json::to_string(note)?,
            );
            let _: bool = self.find_with_retry("note textarea", &js).await?;
        } else if !modal.can_send {
            self.close_overlays().await;
            return Ok(ConnectOutcome::Failed);
        }

        let sent = self.click_button("div[role=\"dialog\"]", r"\bsend\b").await?;
        self.settle().await?;
        if sent {
            info!("🤝 已发送好友请求给 {}", person.name);
            Ok(ConnectOutcome::Sent)
        } else {
            self.close_overlays().await;
            Ok(ConnectOutcome::Failed)
        }
    }

    async fn check_replies(&self, contacts: &[ReplyProbe]) -> Result<ReplyCheck, AutomationError> {
        let mut check = ReplyCheck::default();
        for probe in contacts {
            match self.check_one_reply(probe).await {
                Ok(true) => {
                    info!("💬 {} 已回复", probe.name);
                    check.replied.push(probe.linkedin_url.clone());
                }
                Ok(false) => {}
                Err(e) if e.is_aborted() => return Err(e),
                Err(e) => {
                    warn!("无法检查 {} 的回复: {}", probe.name, e);
                    check.failed.push(probe.name.clone());
                }
            }
        }
        Ok(check)
    }
}

/// 人脉搜索页：公司名为关键词，按关系距离过滤
fn search_url(company: &str, degree: Degree, page: u32) -> Result<Url, AutomationError> {
    let mut url = Url::parse(SEARCH_BASE_URL).map_err(|e| AutomationError::Navigation {
        url: SEARCH_BASE_URL.to_string(),
        reason: e.to_string(),
    })?;
    url.query_pairs_mut()
        .append_pair("keywords", company)
        .append_pair("network", &format!("[\"{}\"]", degree.network_code()))
        .append_pair("origin", "FACETED_SEARCH")
        .append_pair("page", &page.to_string());
    Ok(url)
}
