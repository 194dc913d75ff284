//! 高管过滤：CEO、创始人、C-level、VP 等不做冷启动联系

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

/// 头衔关键字（整词匹配，忽略大小写）
pub const VIP_TITLES: &[&str] = &[
    "ceo",
    "chief executive",
    "cto",
    "chief technology",
    "cfo",
    "chief financial",
    "coo",
    "chief operating",
    "cmo",
    "chief marketing",
    "cpo",
    "chief product",
    "founder",
    "co-founder",
    "cofounder",
    "owner",
    "president",
    "chairman",
    "managing director",
    "general manager",
    "vp",
    "vice president",
];

static VIP_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    let alternatives = VIP_TITLES
        .iter()
        .map(|title| regex::escape(title))
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&format!(r"\b(?:{})\b", alternatives))
        .case_insensitive(true)
        .build()
        .ok()
});

pub fn is_vip(headline: &str) -> bool {
    match VIP_PATTERN.as_ref() {
        Some(re) => re.is_match(headline),
        None => {
            let lower = headline.to_lowercase();
            VIP_TITLES.iter().any(|title| lower.contains(title))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_executives_and_founders() {
        for headline in [
            "CEO at Acme",
            "Co-Founder & CTO",
            "VP R&D | Acme",
            "Vice President of Sales",
            "Founder",
            "General Manager, EMEA",
        ] {
            assert!(is_vip(headline), "{}", headline);
        }
    }

    #[test]
    fn ordinary_titles_pass() {
        for headline in [
            "Software Engineer at Acme",
            "Director of Engineering",
            "Talent Acquisition Coordinator",
            "Recruiter",
            "",
        ] {
            assert!(!is_vip(headline), "{}", headline);
        }
    }
}
