//! 数据模型
//!
//! 任务（Job）、联系人（Contact）、站点规则（SiteSelector）、活动日志（ActivityLog）、
//! 消息模板（Template），以及搜索结果中的人（Person）。

use thiserror::Error;

/// 数据库 / JSON 中的枚举字符串无法识别
#[derive(Debug, Error)]
#[error("unknown {kind} value: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// 以固定字符串持久化的枚举
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::models::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::models::UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

pub mod activity;
pub mod contact;
pub mod job;
pub mod person;
pub mod site_selector;
pub mod template;

pub use activity::{ActionType, ActivityLog};
pub use contact::{Contact, NewContact};
pub use job::{Job, JobStatus, WorkflowStep};
pub use person::{Degree, Gender, Person};
pub use site_selector::{SiteSelector, SiteType};
pub use template::Template;
