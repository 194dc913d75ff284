//! 公司名解析
//!
//! 查找顺序：已学习的站点规则 → 内置招聘平台 → 内置公司官网 → 请用户输入。
//! 用户输入后学习该域名的规则，之后同域名链接可自动解析。

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use super::job_parser;
use crate::db::selector_repo::{self, SelectorRule};
use crate::db::{activity_repo, job_repo, Database};
use crate::error::WorkflowError;
use crate::models::{ActionType, Job, JobStatus, SiteSelector, SiteType};

/// 一次解析的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Extraction {
    Extracted { company_name: String, source: String },
    NeedsInput { domain: String, is_known_platform: bool },
    Failed { message: String },
}

pub struct JobProcessor {
    db: Database,
}

impl JobProcessor {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn load(&self, job_id: i64) -> Result<Job, WorkflowError> {
        job_repo::find_by_id(&self.db, job_id)?.ok_or(WorkflowError::JobNotFound(job_id))
    }

    /// 解析任务链接中的公司名
    ///
    /// # 参数
    /// - `job_id`: 任务 ID
    ///
    /// # 返回
    /// 返回提取结论：公司名、需要用户输入，或失败原因
    pub fn process_job(&self, job_id: i64) -> Result<Extraction, WorkflowError> {
        let mut job = self.load(job_id)?;
        job.status = JobStatus::Processing;
        job_repo::update(&self.db, &job)?;

        let Some(domain) = job_parser::extract_domain(&job.url) else {
            let message = "Could not extract domain from URL".to_string();
            error!("[任务 {}] ❌ {}: {}", job_id, message, job.url);
            job.status = JobStatus::Failed;
            job.error_message = Some(message.clone());
            job_repo::update(&self.db, &job)?;
            activity_repo::record(
                &self.db,
                Some(job_id),
                ActionType::Error,
                &format!("Failed to process job: {}", message),
                Some(json!({ "error": message })),
            )?;
            return Ok(Extraction::Failed { message });
        };
        info!("[任务 {}] 解析域名: {}", job_id, domain);

        if let Some(selector) = selector_repo::find_by_domain(&self.db, &domain)? {
            selector_repo::touch(&self.db, selector.id)?;
            if let Some(company) = company_from_selector(&selector, &job.url) {
                let description = match selector.site_type {
                    SiteType::Company => format!("Company from known site: {}", company),
                    SiteType::Platform => format!("Company extracted from platform URL: {}", company),
                };
                return self.complete(job, company, "database", &domain, description);
            }
            warn!("[任务 {}] 已学习的规则未能匹配: {}", job_id, domain);
            return self.request_input(job, domain, selector.site_type == SiteType::Platform);
        }

        if let Some(platform) = job_parser::find_platform(&domain) {
            info!("[任务 {}] 识别为招聘平台: {}", job_id, platform.name);
            return match job_parser::extract_company_from_url(&job.url, platform.pattern) {
                Some(company) => {
                    let description = format!("Extracted company from platform URL: {}", company);
                    self.complete(job, company, "preconfigured", &domain, description)
                }
                None => self.request_input(job, domain, true),
            };
        }

        if let Some(company) = job_parser::find_company_site(&domain) {
            let description = format!("Company from known site: {}", company);
            return self.complete(job, company.to_string(), "builtin", &domain, description);
        }

        self.request_input(job, domain, false)
    }

    fn complete(
        &self,
        mut job: Job,
        company: String,
        source: &str,
        domain: &str,
        description: String,
    ) -> Result<Extraction, WorkflowError> {
        job.company_name = Some(company.clone());
        job.status = JobStatus::Completed;
        job.error_message = None;
        job.processed_at = Some(Utc::now());
        job_repo::update(&self.db, &job)?;
        activity_repo::record(
            &self.db,
            Some(job.id),
            ActionType::CompanyExtracted,
            &description,
            Some(json!({ "domain": domain, "company_name": company, "source": source })),
        )?;
        info!("[任务 {}] ✅ 公司: {}", job.id, company);
        Ok(Extraction::Extracted {
            company_name: company,
            source: source.to_string(),
        })
    }

    fn request_input(&self, mut job: Job, domain: String, is_known_platform: bool) -> Result<Extraction, WorkflowError> {
        job.status = JobStatus::NeedsInput;
        job_repo::update(&self.db, &job)?;
        activity_repo::record(
            &self.db,
            Some(job.id),
            ActionType::CompanyInputNeeded,
            &format!("Unknown job site: {}. User input needed.", domain),
            Some(json!({ "domain": domain, "url": job.url, "is_known_platform": is_known_platform })),
        )?;
        info!("[任务 {}] ❓ 需要用户提供公司名 ({})", job.id, domain);
        Ok(Extraction::NeedsInput {
            domain,
            is_known_platform,
        })
    }

    /// 用户补充公司信息，并学习该域名的规则
    ///
    /// # 参数
    /// - `job_id`: 处于 NEEDS_INPUT 的任务
    /// - `company_name`: 公司名
    /// - `site_type`: 公司官网或招聘平台
    /// - `platform_name`: 平台名（仅招聘平台）
    ///
    /// # 返回
    /// 返回更新后的任务
    pub fn submit_company_info(
        &self,
        job_id: i64,
        company_name: &str,
        site_type: SiteType,
        platform_name: Option<&str>,
    ) -> Result<Job, WorkflowError> {
        let company_name = company_name.trim();
        if company_name.is_empty() {
            return Err(WorkflowError::Precondition("Company name is required".to_string()));
        }

        let mut job = self.load(job_id)?;
        if job.status != JobStatus::NeedsInput {
            return Err(WorkflowError::Precondition(format!(
                "Job is not waiting for input (status: {})",
                job.status
            )));
        }

        job.company_name = Some(company_name.to_string());
        job.status = JobStatus::Completed;
        job.error_message = None;
        job.processed_at = Some(Utc::now());
        job_repo::update(&self.db, &job)?;

        let domain = job_parser::extract_domain(&job.url);
        if let Some(domain) = &domain {
            self.learn_site(domain, &job.url, company_name, site_type, platform_name)?;
        }

        activity_repo::record(
            &self.db,
            Some(job_id),
            ActionType::CompanyExtracted,
            &format!("Company provided by user: {}", company_name),
            Some(json!({
                "domain": domain,
                "company_name": company_name,
                "site_type": site_type,
                "platform_name": platform_name,
                "user_provided": true,
            })),
        )?;
        info!("[任务 {}] ✅ 用户提供公司名: {}", job_id, company_name);
        Ok(job)
    }

    fn learn_site(
        &self,
        domain: &str,
        url: &str,
        company_name: &str,
        site_type: SiteType,
        platform_name: Option<&str>,
    ) -> Result<(), WorkflowError> {
        let url_pattern = match site_type {
            SiteType::Platform => job_parser::generate_url_pattern(url, company_name),
            SiteType::Company => None,
        };
        let rule = SelectorRule {
            domain: domain.to_string(),
            site_type,
            company_name: Some(company_name.to_string()),
            platform_name: platform_name.map(str::to_string),
            url_pattern: url_pattern.clone(),
            example_url: Some(url.to_string()),
            example_company: Some(company_name.to_string()),
        };
        let (_, created) = selector_repo::upsert(&self.db, &rule)?;
        if created {
            activity_repo::record(
                &self.db,
                None,
                ActionType::SelectorLearned,
                &format!("Learned pattern for domain: {} ({})", domain, site_type),
                Some(json!({
                    "domain": domain,
                    "site_type": site_type,
                    "platform_name": platform_name,
                    "url_pattern": url_pattern,
                })),
            )?;
            info!("📚 学习到新站点规则: {} ({})", domain, site_type);
        }
        Ok(())
    }

    /// 更正公司名；公司官网的已学习规则一并更新
    pub fn update_company_name(&self, job_id: i64, company_name: &str) -> Result<Job, WorkflowError> {
        let company_name = company_name.trim();
        if company_name.is_empty() {
            return Err(WorkflowError::Precondition("Company name is required".to_string()));
        }

        let mut job = self.load(job_id)?;
        if job.is_processing() {
            return Err(WorkflowError::Precondition(
                "Cannot update company while job is processing".to_string(),
            ));
        }

        let previous = job.company_name.replace(company_name.to_string());
        job_repo::update(&self.db, &job)?;

        if let Some(domain) = job_parser::extract_domain(&job.url) {
            if selector_repo::update_company(&self.db, &domain, company_name)? {
                info!("[任务 {}] 更新站点规则 {} 的公司名", job_id, domain);
            }
        }

        activity_repo::record(
            &self.db,
            Some(job_id),
            ActionType::CompanyExtracted,
            &format!("Company name updated to: {}", company_name),
            Some(json!({ "previous": previous, "company_name": company_name, "user_provided": true })),
        )?;
        Ok(job)
    }
}

fn company_from_selector(selector: &SiteSelector, url: &str) -> Option<String> {
    match selector.site_type {
        SiteType::Company => selector
            .company_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string),
        SiteType::Platform => selector
            .url_pattern
            .as_deref()
            .and_then(|pattern| job_parser::extract_company_from_url(url, pattern)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkflowStep;

    fn setup(url: &str) -> (JobProcessor, i64) {
        let db = Database::open_in_memory().unwrap();
        let job = job_repo::insert(&db, url).unwrap();
        (JobProcessor::new(db), job.id)
    }

    #[test]
    fn extracts_company_from_builtin_platform() {
        let (processor, id) = setup("https://jobs.lever.co/acme/123");
        let outcome = processor.process_job(id).unwrap();
        assert!(matches!(outcome, Extraction::Extracted { ref company_name, .. } if company_name == "Acme"));

        let job = processor.load(id).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.company_name.as_deref(), Some("Acme"));
        assert_eq!(job.workflow_step, WorkflowStep::CompanyExtraction);
        assert!(job.processed_at.is_some());
    }

    #[test]
    fn unknown_site_needs_input_then_learns() {
        let (processor, id) = setup("https://careers.initech.example/jobs/42");
        let outcome = processor.process_job(id).unwrap();
        assert!(matches!(outcome, Extraction::NeedsInput { ref domain, is_known_platform: false } if domain == "careers.initech.example"));
        assert_eq!(processor.load(id).unwrap().status, JobStatus::NeedsInput);

        let job = processor
            .submit_company_info(id, "Initech", SiteType::Company, None)
            .unwrap();
        assert_eq!(job.status, JobStatus::Completed);

        // 同域名的新链接直接命中已学习的规则
        let second = job_repo::insert(&processor.db, "https://careers.initech.example/jobs/43").unwrap();
        let outcome = processor.process_job(second.id).unwrap();
        assert!(matches!(outcome, Extraction::Extracted { ref company_name, ref source } if company_name == "Initech" && source == "database"));

        let logs = activity_repo::list_recent(&processor.db, 50).unwrap();
        assert!(logs.iter().any(|l| l.action_type == ActionType::SelectorLearned));
    }

    #[test]
    fn learned_platform_pattern_extracts_other_companies() {
        let (processor, id) = setup("https://hire.jobhost.example/c/tailor-brands/7");
        processor.process_job(id).unwrap();
        processor
            .submit_company_info(id, "Tailor Brands", SiteType::Platform, Some("jobhost"))
            .unwrap();

        let other = job_repo::insert(&processor.db, "https://hire.jobhost.example/c/globex/9").unwrap();
        let outcome = processor.process_job(other.id).unwrap();
        assert!(matches!(outcome, Extraction::Extracted { ref company_name, .. } if company_name == "Globex"));
    }

    #[test]
    fn submit_requires_needs_input() {
        let (processor, id) = setup("https://jobs.lever.co/acme/123");
        processor.process_job(id).unwrap();
        let err = processor
            .submit_company_info(id, "Other", SiteType::Company, None)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Precondition(_)));
    }

    #[test]
    fn malformed_url_fails_with_error_activity() {
        let (processor, id) = setup("definitely not a url");
        let outcome = processor.process_job(id).unwrap();
        assert!(matches!(outcome, Extraction::Failed { .. }));
        let job = processor.load(id).unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error_message.as_deref(), Some("Could not extract domain from URL"));
    }

    #[test]
    fn update_company_name_corrects_selector() {
        let (processor, id) = setup("https://careers.initech.example/jobs/42");
        processor.process_job(id).unwrap();
        processor
            .submit_company_info(id, "Intech", SiteType::Company, None)
            .unwrap();

        let job = processor.update_company_name(id, "Initech").unwrap();
        assert_eq!(job.company_name.as_deref(), Some("Initech"));
        let selector = selector_repo::find_by_domain(&processor.db, "careers.initech.example")
            .unwrap()
            .unwrap();
        assert_eq!(selector.company_name.as_deref(), Some("Initech"));
    }
}
