//! `site_selectors` 表

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use super::{enum_column, opt_time_column, time_column, time_to_text, Database, DatabaseError};
use crate::models::{SiteSelector, SiteType};

fn from_row(row: &Row<'_>) -> rusqlite::Result<SiteSelector> {
    Ok(SiteSelector {
        id: row.get("id")?,
        domain: row.get("domain")?,
        site_type: enum_column(row, "site_type")?,
        company_name: row.get("company_name")?,
        platform_name: row.get("platform_name")?,
        url_pattern: row.get("url_pattern")?,
        example_url: row.get("example_url")?,
        example_company: row.get("example_company")?,
        created_at: time_column(row, "created_at")?,
        last_used_at: opt_time_column(row, "last_used_at")?,
    })
}

/// 学习到的规则
#[derive(Debug, Clone)]
pub struct SelectorRule {
    pub domain: String,
    pub site_type: SiteType,
    pub company_name: Option<String>,
    pub platform_name: Option<String>,
    pub url_pattern: Option<String>,
    pub example_url: Option<String>,
    pub example_company: Option<String>,
}

pub fn find_by_domain(db: &Database, domain: &str) -> Result<Option<SiteSelector>, DatabaseError> {
    db.with_conn(|conn| {
        let selector = conn
            .query_row(
                "SELECT * FROM site_selectors WHERE domain = ?1",
                params![domain],
                from_row,
            )
            .optional()?;
        Ok(selector)
    })
}

/// 按域名插入或更新站点规则
///
/// # 参数
/// - `rule`: 域名与提取规则
///
/// # 返回
/// 返回 (规则, 是否为新建)
pub fn upsert(db: &Database, rule: &SelectorRule) -> Result<(SiteSelector, bool), DatabaseError> {
    let created = find_by_domain(db, &rule.domain)?.is_none();
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO site_selectors
                (domain, site_type, company_name, platform_name, url_pattern, example_url, example_company, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(domain) DO UPDATE SET
                site_type = excluded.site_type,
                company_name = excluded.company_name,
                platform_name = excluded.platform_name,
                url_pattern = excluded.url_pattern,
                example_url = excluded.example_url,
                example_company = excluded.example_company",
            params![
                rule.domain,
                rule.site_type.as_str(),
                rule.company_name,
                rule.platform_name,
                rule.url_pattern,
                rule.example_url,
                rule.example_company,
                time_to_text(&Utc::now()),
            ],
        )?;
        Ok(())
    })?;

    let selector = find_by_domain(db, &rule.domain)?
        .ok_or(DatabaseError::Sqlite(rusqlite::Error::QueryReturnedNoRows))?;
    Ok((selector, created))
}

pub fn touch(db: &Database, id: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE site_selectors SET last_used_at = ?2 WHERE id = ?1",
            params![id, time_to_text(&Utc::now())],
        )?;
        Ok(())
    })
}

/// 更正公司站点的公司名；平台规则不受影响
pub fn update_company(db: &Database, domain: &str, company_name: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute(
            "UPDATE site_selectors SET company_name = ?2 WHERE domain = ?1 AND site_type = ?3",
            params![domain, company_name, SiteType::Company.as_str()],
        )?;
        Ok(affected > 0)
    })
}

pub fn list(db: &Database) -> Result<Vec<SiteSelector>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM site_selectors ORDER BY domain")?;
        let selectors = stmt.query_map([], from_row)?.collect::<Result<Vec<_>, _>>()?;
        Ok(selectors)
    })
}
