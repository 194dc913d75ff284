use serde::{Deserialize, Serialize};

text_enum! {
    pub enum Gender {
        Male => "male",
        Female => "female",
        Unknown => "unknown",
    }
}

/// LinkedIn 人脉距离
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Degree {
    First,
    Second,
    ThirdPlus,
}

impl Degree {
    /// 搜索 URL 中 `network` 过滤参数的取值
    pub fn network_code(&self) -> &'static str {
        match self {
            Degree::First => "F",
            Degree::Second => "S",
            Degree::ThirdPlus => "O",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Degree::First => "1st",
            Degree::Second => "2nd",
            Degree::ThirdPlus => "3rd+",
        }
    }
}

/// 搜索结果中的一个人
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    #[serde(default)]
    pub headline: String,
    pub linkedin_url: Option<String>,
    pub degree: Degree,
}

impl Person {
    pub fn new(name: impl Into<String>, headline: impl Into<String>, linkedin_url: impl Into<String>, degree: Degree) -> Self {
        Self {
            name: name.into(),
            headline: headline.into(),
            linkedin_url: Some(linkedin_url.into()),
            degree,
        }
    }

    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("")
    }

    /// 头衔里提到了目标公司（不区分大小写）
    pub fn works_at(&self, company: &str) -> bool {
        let company = company.trim().to_lowercase();
        !company.is_empty() && self.headline.to_lowercase().contains(&company)
    }

    /// 个人主页 URL 中的 public id（`/in/<id>/`）
    pub fn public_id(&self) -> Option<&str> {
        self.linkedin_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .and_then(|url| url.rsplit('/').next())
            .filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn works_at_matches_headline_case_insensitively() {
        let person = Person::new("Bob Wilson", "Backend Engineer at ACME Corp", "https://www.linkedin.com/in/bob/", Degree::Second);
        assert!(person.works_at("Acme"));
        assert!(!person.works_at("Globex"));
        assert!(!person.works_at("  "));
    }

    #[test]
    fn first_name_and_public_id() {
        let person = Person::new("Dana  Levi", "", "https://www.linkedin.com/in/dana-levi/", Degree::First);
        assert_eq!(person.first_name(), "Dana");
        assert_eq!(person.public_id(), Some("dana-levi"));
    }
}
