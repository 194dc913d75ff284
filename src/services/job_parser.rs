//! 职位链接解析
//!
//! 从 URL 中取出域名，并按内置的招聘平台表 / 公司官网表识别公司名。

use phf::phf_map;
use regex::RegexBuilder;
use tracing::{debug, info, warn};
use url::Url;

/// 多公司招聘平台：域名 → (平台名, 提取公司名的正则，第 1 组为公司)
static JOB_PLATFORMS: phf::Map<&'static str, (&'static str, &'static str)> = phf_map! {
    "greenhouse.io" => ("greenhouse", r"boards\.greenhouse\.io/([^/]+)"),
    "boards.greenhouse.io" => ("greenhouse", r"boards\.greenhouse\.io/([^/]+)"),
    "job-boards.eu.greenhouse.io" => ("greenhouse", r"job-boards\.eu\.greenhouse\.io/([^/]+)"),
    "lever.co" => ("lever", r"jobs\.lever\.co/([^/]+)"),
    "jobs.lever.co" => ("lever", r"jobs\.lever\.co/([^/]+)"),
    "jobs.eu.lever.co" => ("lever", r"jobs\.eu\.lever\.co/([^/]+)"),
    "myworkdayjobs.com" => ("workday", r"://([^.]+)\.wd\d*\.myworkdayjobs\.com"),
    "ashbyhq.com" => ("ashby", r"jobs\.ashbyhq\.com/([^/]+)"),
    "jobs.ashbyhq.com" => ("ashby", r"jobs\.ashbyhq\.com/([^/]+)"),
    "smartrecruiters.com" => ("smartrecruiters", r"jobs\.smartrecruiters\.com/([^/]+)"),
    "jobs.smartrecruiters.com" => ("smartrecruiters", r"jobs\.smartrecruiters\.com/([^/]+)"),
    "breezy.hr" => ("breezy", r"://([^.]+)\.breezy\.hr"),
    "applytojob.com" => ("applytojob", r"://([^.]+)\.applytojob\.com"),
    "recruitee.com" => ("recruitee", r"://([^.]+)\.recruitee\.com"),
    "bamboohr.com" => ("bamboohr", r"://([^.]+)\.bamboohr\.com"),
    "icims.com" => ("icims", r"://careers-([^.]+)\.icims\.com"),
    "comeet.com" => ("comeet", r"comeet\.com/jobs/([^/]+)"),
};

/// 公司官网招聘页：域名 → 公司名
static KNOWN_COMPANY_SITES: phf::Map<&'static str, &'static str> = phf_map! {
    "agorareal.com" => "Agora",
    "amazon.jobs" => "Amazon",
    "careers.cisco.com" => "Cisco",
    "careers.eladsoft.com" => "Elad",
    "careers.ibm.com" => "IBM",
    "careers.qualitestgroup.com" => "Qualitest",
    "careers.riverside.com" => "Riverside",
    "catonetworks.com" => "Cato",
    "dotcompliance.com" => "Dot Compliance",
    "elbitsystemscareer.com" => "Elbit",
    "fullpath.com" => "Fullpath",
    "global-e.com" => "Global E",
    "homedepot.com" => "Home Depot",
    "imagry.co" => "Imagry",
    "jobs.sap.com" => "SAP",
    "kmslh.com" => "KMS",
    "mccann.co.il" => "McCANN",
    "nanit.com" => "Nanit",
    "nayax.com" => "Nayax",
    "papaya.com" => "Papaya",
    "rapyd.net" => "Rapyd",
    "superplay.co" => "Super Play",
    "surecomp.com" => "Surecomp",
    "tailorbrands.com" => "Tailor Brands",
    "tailormed.co" => "Tailormed",
    "waterfall-security.com" => "Waterfall",
};

/// 内置平台的识别结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub name: &'static str,
    pub pattern: &'static str,
}

/// 只接受带主机名的绝对 URL
fn parse(url: &str) -> Option<Url> {
    let parsed = Url::parse(url.trim()).ok()?;
    parsed.host_str().filter(|host| !host.is_empty())?;
    Some(parsed)
}

/// 域名（小写，去掉 `www.`）；无法解析时返回 `None`
pub fn extract_domain(url: &str) -> Option<String> {
    let parsed = parse(url)?;
    let host = parsed.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").map(str::to_string).unwrap_or(host);
    (!host.is_empty()).then_some(host)
}

/// 精确匹配优先，否则取最长的后缀匹配（须落在 `.` 边界上）
fn lookup<'a, V>(table: &'a phf::Map<&'static str, V>, domain: &str) -> Option<&'a V> {
    if let Some(value) = table.get(domain) {
        return Some(value);
    }
    table
        .entries()
        .filter(|(key, _)| domain.ends_with(&format!(".{}", key)))
        .max_by_key(|(key, _)| key.len())
        .map(|(_, value)| value)
}

pub fn find_platform(domain: &str) -> Option<Platform> {
    lookup(&JOB_PLATFORMS, domain).map(|&(name, pattern)| Platform { name, pattern })
}

pub fn find_company_site(domain: &str) -> Option<&'static str> {
    lookup(&KNOWN_COMPANY_SITES, domain).copied()
}

/// 用正则（忽略大小写，取第 1 组）从 URL 中提取公司名，`-`/`_` 换成空格后按单词首字母大写
///
/// # 参数
/// - `url`: 职位链接
/// - `pattern`: 提取规则，第 1 组为公司名
///
/// # 返回
/// 返回公司名；规则无效或不匹配时为 `None`
pub fn extract_company_from_url(url: &str, pattern: &str) -> Option<String> {
    let re = match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(re) => re,
        Err(e) => {
            warn!("无效的 URL 规则 '{}': {}", pattern, e);
            return None;
        }
    };
    let raw = re.captures(url)?.get(1)?.as_str();
    let company = title_case(&raw.replace(['-', '_'], " "));
    let company = company.trim().to_string();
    if company.is_empty() {
        return None;
    }
    info!("从 URL 提取到公司名: {}", company);
    Some(company)
}

/// 每段连续字母首字母大写，其余小写
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}

fn normalize(text: &str) -> String {
    text.to_lowercase().replace([' ', '-', '_'], "")
}

/// 根据用户给出的公司名，为平台链接生成提取规则
///
/// 依次尝试：子域名、路径段、URL 中字面出现的位置。
pub fn generate_url_pattern(url: &str, company_name: &str) -> Option<String> {
    let company = normalize(company_name);
    if company.is_empty() {
        return None;
    }

    let parsed = parse(url)?;
    let host = parsed.host_str()?.to_string();

    let host_parts: Vec<&str> = host.split('.').collect();
    if host_parts.len() > 2 {
        let subdomain = normalize(host_parts[0]);
        if subdomain.contains(&company) {
            let pattern = format!(r"([^.]+)\.{}", regex::escape(&host_parts[1..].join(".")));
            debug!("生成子域名规则: {}", pattern);
            return Some(pattern);
        }
    }

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();
    for (i, segment) in segments.iter().enumerate() {
        if normalize(segment).contains(&company) {
            let mut pattern = regex::escape(&host);
            for prefix in &segments[..i] {
                pattern.push('/');
                pattern.push_str(&regex::escape(prefix));
            }
            pattern.push_str("/([^/]+)");
            debug!("生成路径规则: {}", pattern);
            return Some(pattern);
        }
    }

    let lower_name = company_name.to_lowercase();
    let variants = [
        lower_name.clone(),
        lower_name.replace(' ', "-"),
        lower_name.replace(' ', "_"),
        lower_name.replace(' ', ""),
    ];
    let url_lower = url.to_lowercase();
    for variant in variants.iter().filter(|v| !v.is_empty()) {
        if let Some(idx) = url_lower.find(variant.as_str()) {
            // 小写化可能改变字节长度，此时放弃该候选
            let Some(before) = url.get(..idx) else { continue };
            let pattern = format!(r"{}([^/.\-_]+)", regex::escape(before));
            debug!("生成兜底规则: {}", pattern);
            return Some(pattern);
        }
    }

    warn!("无法为 {} 生成 URL 规则", url);
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_is_lowercased_without_www() {
        assert_eq!(extract_domain("https://WWW.Comeet.com/jobs/acme/1").as_deref(), Some("comeet.com"));
        assert_eq!(extract_domain("https://jobs.lever.co:443/acme").as_deref(), Some("jobs.lever.co"));
        assert_eq!(extract_domain("not a url"), None);
        assert_eq!(extract_domain("https://user:pw@Jobs.Lever.co/acme").as_deref(), Some("jobs.lever.co"));
        assert_eq!(extract_domain("mailto:jobs@acme.com"), None);
    }

    #[test]
    fn platform_lookup_prefers_exact_then_longest_suffix() {
        assert_eq!(find_platform("jobs.lever.co").map(|p| p.name), Some("lever"));
        assert_eq!(find_platform("acme.wd5.myworkdayjobs.com").map(|p| p.name), Some("workday"));
        assert_eq!(
            find_platform("job-boards.eu.greenhouse.io").map(|p| p.pattern),
            Some(r"job-boards\.eu\.greenhouse\.io/([^/]+)")
        );
        assert!(find_platform("notlever.co").is_none());
    }

    #[test]
    fn extracts_company_from_platform_urls() {
        let lever = find_platform("jobs.lever.co").unwrap();
        assert_eq!(
            extract_company_from_url("https://jobs.lever.co/acme/123", lever.pattern).as_deref(),
            Some("Acme")
        );

        let workday = find_platform("big-corp.wd3.myworkdayjobs.com").unwrap();
        assert_eq!(
            extract_company_from_url("https://big-corp.wd3.myworkdayjobs.com/en-US/careers", workday.pattern).as_deref(),
            Some("Big Corp")
        );

        let icims = find_platform("careers-globex.icims.com").unwrap();
        assert_eq!(
            extract_company_from_url("https://careers-globex.icims.com/jobs/1", icims.pattern).as_deref(),
            Some("Globex")
        );
    }

    #[test]
    fn company_sites_match_subdomains() {
        assert_eq!(find_company_site("tailorbrands.com"), Some("Tailor Brands"));
        assert_eq!(find_company_site("jobs.nayax.com"), Some("Nayax"));
        assert_eq!(find_company_site("example.com"), None);
    }

    #[test]
    fn generates_subdomain_pattern() {
        let pattern = generate_url_pattern("https://acme.jobsite.io/positions/7", "Acme").unwrap();
        assert_eq!(pattern, r"([^.]+)\.jobsite\.io");
        assert_eq!(
            extract_company_from_url("https://globex.jobsite.io/positions/9", &pattern).as_deref(),
            Some("Globex")
        );
    }

    #[test]
    fn generates_path_pattern() {
        let pattern = generate_url_pattern("https://hire.example.com/c/tailor-brands/job/1", "Tailor Brands").unwrap();
        assert_eq!(pattern, r"hire\.example\.com/c/([^/]+)");
        assert_eq!(
            extract_company_from_url("https://hire.example.com/c/initech/job/5", &pattern).as_deref(),
            Some("Initech")
        );
    }

    #[test]
    fn path_pattern_ignores_query_and_fragment() {
        let pattern =
            generate_url_pattern("https://hire.example.com/c/initech/job/1?ref=initech#apply", "Initech").unwrap();
        assert_eq!(pattern, r"hire\.example\.com/c/([^/]+)");
    }

    #[test]
    fn no_pattern_when_company_absent() {
        assert!(generate_url_pattern("https://example.com/jobs/123", "Acme").is_none());
    }
}
