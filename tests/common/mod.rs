#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use linkedin_outreach::api::JobService;
use linkedin_outreach::browser::{BrowserAutomationSurface, ConnectOutcome, ReplyCheck, ReplyProbe};
use linkedin_outreach::db::{job_repo, template_repo, Database};
use linkedin_outreach::models::{Degree, Job, JobStatus, Person, Template, WorkflowStep};
use linkedin_outreach::orchestrator::{JobRunner, WorkflowOptions, WorkflowOrchestrator, WorkflowResult};
use linkedin_outreach::services::{NameDirectory, NameResolution};
use linkedin_outreach::workflow::SearchSettings;
use linkedin_outreach::{AutomationError, SessionCoordinator};

/// 模拟用户点"中止"的时机
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortPoint {
    Search,
    ReplyCheck,
}

/// 按脚本返回结果的浏览器，并记录所有调用
#[derive(Default)]
pub struct MockSurface {
    /// 每个距离的分页结果（下标 0 为第 1 页）
    pages: HashMap<Degree, Vec<Vec<Person>>>,
    history: HashSet<String>,
    no_connect: HashSet<String>,
    replied: Vec<String>,
    unreachable: Vec<String>,
    fail_search: bool,
    search_delay: Option<Duration>,
    abort_after_requests: Mutex<Option<(Arc<SessionCoordinator>, i64, usize)>>,
    abort_at: Mutex<Option<(AbortPoint, Arc<SessionCoordinator>, i64)>>,

    pub searches: Mutex<Vec<(Degree, u32)>>,
    pub messages: Mutex<Vec<(String, String)>>,
    pub requests: Mutex<Vec<String>>,
    pub reply_checks: Mutex<Vec<Vec<String>>>,
    active: AtomicUsize,
    pub max_active: AtomicUsize,
}

impl MockSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, degree: Degree, people: Vec<Person>) -> Self {
        self.pages.entry(degree).or_default().push(people);
        self
    }

    pub fn with_history(mut self, url: &str) -> Self {
        self.history.insert(url.to_string());
        self
    }

    pub fn without_connect(mut self, url: &str) -> Self {
        self.no_connect.insert(url.to_string());
        self
    }

    pub fn with_reply_from(mut self, url: &str) -> Self {
        self.replied.push(url.to_string());
        self
    }

    pub fn with_unreachable(mut self, url: &str) -> Self {
        self.unreachable.push(url.to_string());
        self
    }

    pub fn failing_search(mut self) -> Self {
        self.fail_search = true;
        self
    }

    pub fn with_search_delay(mut self, delay: Duration) -> Self {
        self.search_delay = Some(delay);
        self
    }

    /// 发出 `count` 个好友请求后替用户点"中止"
    pub fn abort_after_requests(&self, session: Arc<SessionCoordinator>, job_id: i64, count: usize) {
        *self.abort_after_requests.lock().unwrap() = Some((session, job_id, count));
    }

    /// 浏览器执行到 `point` 时替用户点"中止"，该次调用返回 `Aborted`
    pub fn abort_at(&self, point: AbortPoint, session: Arc<SessionCoordinator>, job_id: i64) {
        *self.abort_at.lock().unwrap() = Some((point, session, job_id));
    }

    fn abort_if(&self, point: AbortPoint) -> Result<(), AutomationError> {
        if let Some((at, session, job_id)) = self.abort_at.lock().unwrap().as_ref() {
            if *at == point {
                session.request_abort(*job_id);
                return session.check_abort();
            }
        }
        Ok(())
    }

    pub fn sent_messages(&self) -> Vec<(String, String)> {
        self.messages.lock().unwrap().clone()
    }

    pub fn sent_requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn searched(&self) -> Vec<(Degree, u32)> {
        self.searches.lock().unwrap().clone()
    }
}

#[async_trait]
impl BrowserAutomationSurface for MockSurface {
    async fn search_people(&self, _company: &str, degree: Degree, page: u32) -> Result<Vec<Person>, AutomationError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.search_delay {
            tokio::time::sleep(delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        self.searches.lock().unwrap().push((degree, page));
        self.abort_if(AbortPoint::Search)?;
        if self.fail_search {
            return Err(AutomationError::ElementNotFound {
                what: "search results".to_string(),
                attempts: 4,
            });
        }
        Ok(self
            .pages
            .get(&degree)
            .and_then(|pages| pages.get(page as usize - 1))
            .cloned()
            .unwrap_or_default())
    }

    async fn has_conversation_history(&self, person: &Person) -> Result<bool, AutomationError> {
        Ok(person
            .linkedin_url
            .as_ref()
            .is_some_and(|url| self.history.contains(url)))
    }

    async fn send_message(&self, person: &Person, text: &str) -> Result<bool, AutomationError> {
        self.messages
            .lock()
            .unwrap()
            .push((person.name.clone(), text.to_string()));
        Ok(true)
    }

    async fn send_connection_request(&self, person: &Person, _note: Option<&str>) -> Result<ConnectOutcome, AutomationError> {
        let url = person.linkedin_url.clone().unwrap_or_default();
        if self.no_connect.contains(&url) {
            return Ok(ConnectOutcome::NoConnectButton);
        }
        let sent = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(person.name.clone());
            requests.len()
        };
        if let Some((session, job_id, count)) = self.abort_after_requests.lock().unwrap().as_ref() {
            if sent >= *count {
                session.request_abort(*job_id);
            }
        }
        Ok(ConnectOutcome::Sent)
    }

    async fn check_replies(&self, contacts: &[ReplyProbe]) -> Result<ReplyCheck, AutomationError> {
        self.reply_checks
            .lock()
            .unwrap()
            .push(contacts.iter().map(|c| c.name.clone()).collect());
        self.abort_if(AbortPoint::ReplyCheck)?;
        let mut check = ReplyCheck::default();
        for contact in contacts {
            if self.unreachable.contains(&contact.linkedin_url) {
                check.failed.push(contact.name.clone());
            } else if self.replied.contains(&contact.linkedin_url) {
                check.replied.push(contact.linkedin_url.clone());
            }
        }
        Ok(check)
    }
}

pub fn person(name: &str, headline: &str, degree: Degree) -> Person {
    let slug = name.to_lowercase().replace(' ', "-");
    Person::new(name, headline, format!("https://www.linkedin.com/in/{}/", slug), degree)
}

pub fn profile_url(name: &str) -> String {
    format!("https://www.linkedin.com/in/{}/", name.to_lowercase().replace(' ', "-"))
}

/// 内存数据库 + 模拟浏览器 + 真实的编排层和服务层
pub struct Harness {
    pub db: Database,
    pub session: Arc<SessionCoordinator>,
    pub surface: Arc<MockSurface>,
    pub names: Arc<NameDirectory>,
    pub orchestrator: Arc<WorkflowOrchestrator>,
    pub runner: JobRunner,
    pub service: JobService,
}

impl Harness {
    pub fn new(surface: MockSurface) -> Self {
        Self::with_db(Database::open_in_memory().unwrap(), surface)
    }

    pub fn with_db(db: Database, surface: MockSurface) -> Self {
        let session = Arc::new(SessionCoordinator::new(Duration::from_millis(2), Duration::from_millis(1)));
        let surface = Arc::new(surface);
        let names = Arc::new(NameDirectory::load(db.clone()).unwrap());
        let settings = SearchSettings {
            search_limit: 15,
            max_connection_requests: 5,
            max_search_pages: 5,
            action_delay: Duration::from_millis(1),
        };
        let browser: Arc<dyn BrowserAutomationSurface> = surface.clone();
        let resolver: Arc<dyn NameResolution> = names.clone();
        let orchestrator = Arc::new(WorkflowOrchestrator::new(
            db.clone(),
            session.clone(),
            browser,
            resolver,
            settings,
        ));
        let runner = JobRunner::new(db.clone(), orchestrator.clone());
        let service = JobService::new(db.clone(), runner.clone(), names.clone());
        Self {
            db,
            session,
            surface,
            names,
            orchestrator,
            runner,
            service,
        }
    }

    pub fn english_template(&self) -> Template {
        template_repo::insert(&self.db, "english", "Hi {name}, are you still at {company}?", None, None, true).unwrap()
    }

    pub fn hebrew_template(&self) -> Template {
        template_repo::insert(&self.db, "hebrew", "היי {שם}, ראיתי משרה ב{חברה}", None, None, true).unwrap()
    }

    pub fn job_at(&self, company: Option<&str>, step: WorkflowStep, status: JobStatus) -> Job {
        let count = job_repo::list(&self.db).unwrap().len();
        let mut job = job_repo::insert(&self.db, &format!("https://jobs.lever.co/acme/{}", 123 + count)).unwrap();
        job.company_name = company.map(str::to_string);
        job.workflow_step = step;
        job.status = status;
        job_repo::update(&self.db, &job).unwrap();
        job
    }

    pub fn job(&self, job_id: i64) -> Job {
        job_repo::find_by_id(&self.db, job_id).unwrap().unwrap()
    }

    /// 和 HTTP 路径一样：先入队，再运行
    pub async fn run(&self, job_id: i64, options: WorkflowOptions) -> WorkflowResult {
        self.session.enqueue(job_id);
        self.orchestrator.run_workflow(job_id, &options).await.unwrap()
    }

    /// 等到浏览器空闲且队列为空（后台工作流已结束并落库）
    pub async fn wait_idle(&self) {
        for _ in 0..500 {
            let snapshot = self.session.snapshot();
            if snapshot.current_job_id.is_none() && snapshot.queued_jobs.is_empty() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("browser session never became idle: {:?}", self.session.snapshot());
    }
}
