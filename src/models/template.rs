use serde::Serialize;

use super::Gender;

/// 消息模板
///
/// 占位符：`{name}` / `{company}`，以及希伯来语的 `{שם}` / `{חברה}`。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    pub id: i64,
    pub name: String,
    pub content: String,
    pub content_male: Option<String>,
    pub content_female: Option<String>,
    pub is_default: bool,
}

impl Template {
    /// 按性别选择正文，没有对应变体时回退到通用正文
    pub fn content_for(&self, gender: Gender) -> &str {
        let variant = match gender {
            Gender::Male => self.content_male.as_deref(),
            Gender::Female => self.content_female.as_deref(),
            Gender::Unknown => None,
        };
        variant
            .filter(|text| !text.trim().is_empty())
            .unwrap_or(&self.content)
    }
}

/// 替换模板占位符
pub fn render(content: &str, name: &str, company: &str) -> String {
    content
        .replace("{שם}", name)
        .replace("{חברה}", company)
        .replace("{name}", name)
        .replace("{company}", company)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> Template {
        Template {
            id: 1,
            name: "default".to_string(),
            content: "Hi {name}, I saw an opening at {company}".to_string(),
            content_male: Some("היי {שם}, ראיתי משרה ב{חברה}, אתה מכיר?".to_string()),
            content_female: Some("  ".to_string()),
            is_default: true,
        }
    }

    #[test]
    fn picks_gender_variant_and_falls_back() {
        let t = template();
        assert!(t.content_for(Gender::Male).contains("אתה"));
        assert_eq!(t.content_for(Gender::Female), t.content);
        assert_eq!(t.content_for(Gender::Unknown), t.content);
    }

    #[test]
    fn renders_both_placeholder_sets() {
        assert_eq!(render("Hi {name} @ {company}", "Bob", "Acme"), "Hi Bob @ Acme");
        assert_eq!(render("היי {שם} מ{חברה}", "דנה", "Acme"), "היי דנה מAcme");
    }
}
