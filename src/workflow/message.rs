//! 消息生成
//!
//! 希伯来文模板需要希伯来文的名；缺少译名时返回 `MessageDraft::NeedsTranslation`，
//! 由编排层暂停任务等待用户补充。

use tracing::debug;

use crate::models::template::render;
use crate::models::{Person, Template};
use crate::services::{is_hebrew_text, NameResolution};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageDraft {
    Ready(String),
    /// 缺少译名的名
    NeedsTranslation(Vec<String>),
}

pub struct MessageComposer<'a> {
    template: &'a Template,
    company: &'a str,
    names: &'a dyn NameResolution,
}

impl<'a> MessageComposer<'a> {
    pub fn new(template: &'a Template, company: &'a str, names: &'a dyn NameResolution) -> Self {
        Self {
            template,
            company,
            names,
        }
    }

    /// 按性别选择模板并填充占位符
    ///
    /// # 参数
    /// - `person`: 收件人
    ///
    /// # 返回
    /// 返回消息正文；希伯来文模板缺少译名时返回 `NeedsTranslation`
    pub fn compose(&self, person: &Person) -> MessageDraft {
        let first_name = match person.first_name() {
            "" => person.name.trim(),
            first => first,
        };
        let gender = self.names.detect_gender(&person.name);
        let content = self.template.content_for(gender);

        let display_name = if is_hebrew_text(content) {
            match self.names.translate_to_hebrew(&person.name) {
                Some(hebrew) => hebrew,
                None => {
                    debug!("缺少 {} 的希伯来文译名", first_name);
                    return MessageDraft::NeedsTranslation(vec![first_name.to_string()]);
                }
            }
        } else {
            first_name.to_string()
        };

        MessageDraft::Ready(render(content, &display_name, self.company))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Degree, Gender};
    use crate::services::NameDirectory;

    fn template(content: &str) -> Template {
        Template {
            id: 1,
            name: "t".to_string(),
            content: content.to_string(),
            content_male: Some("היי {שם}, אתה עובד ב{חברה}?".to_string()),
            content_female: Some("היי {שם}, את עובדת ב{חברה}?".to_string()),
            is_default: true,
        }
    }

    fn person(name: &str) -> Person {
        Person::new(name, "Engineer at Acme", "https://www.linkedin.com/in/x/", Degree::First)
    }

    #[test]
    fn english_template_uses_first_name() {
        let names = NameDirectory::builtin();
        let t = template("Hi {name}, are you still at {company}?");
        let composer = MessageComposer::new(&t, "Acme", &names);
        assert_eq!(
            composer.compose(&person("Bob Wilson")),
            MessageDraft::Ready("Hi Bob, are you still at Acme?".to_string())
        );
    }

    #[test]
    fn hebrew_variant_uses_translated_name() {
        let names = NameDirectory::builtin();
        assert_eq!(names.detect_gender("Yael"), Gender::Female);
        let t = template("Hi {name}");
        let composer = MessageComposer::new(&t, "Acme", &names);
        assert_eq!(
            composer.compose(&person("Yael Cohen")),
            MessageDraft::Ready("היי יעל, את עובדת בAcme?".to_string())
        );
    }

    #[test]
    fn missing_translation_is_reported() {
        let names = NameDirectory::builtin();
        let t = template("שלום {שם}");
        let composer = MessageComposer::new(&t, "Acme", &names);
        assert_eq!(
            composer.compose(&person("Xena Warrior")),
            MessageDraft::NeedsTranslation(vec!["Xena".to_string()])
        );
    }
}
