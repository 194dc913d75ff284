use chrono::{DateTime, Utc};
use serde::Serialize;

text_enum! {
    pub enum SiteType {
        /// 公司自己的招聘页：域名直接对应公司
        Company => "company",
        /// 多租户招聘平台：公司名从 URL 中提取
        Platform => "platform",
    }
}

/// 学到的（或预置的）域名 → 公司提取规则
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteSelector {
    pub id: i64,
    pub domain: String,
    pub site_type: SiteType,
    pub company_name: Option<String>,
    pub platform_name: Option<String>,
    /// 平台类型使用：第一个捕获组为公司名
    pub url_pattern: Option<String>,
    pub example_url: Option<String>,
    pub example_company: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}
