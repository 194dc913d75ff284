use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// HTTP 监听地址
    pub bind_addr: SocketAddr,
    /// SQLite 数据库路径
    pub database_path: PathBuf,
    /// 已启动浏览器的调试端口；为空时自行启动浏览器
    pub browser_debug_port: Option<u16>,
    /// 浏览器用户数据目录（保存 LinkedIn 登录态）
    pub browser_data_dir: PathBuf,
    /// 是否显示浏览器窗口
    pub browser_visible: bool,
    /// 快速模式：动作间隔 300ms，否则 1000ms
    pub fast_mode: bool,
    /// 等待浏览器轮询间隔（毫秒）
    pub queue_poll_interval_ms: u64,
    /// 可中断等待的切片长度（毫秒）
    pub abort_slice_ms: u64,
    /// 每次搜索的人数上限
    pub search_limit: usize,
    /// 单次运行最多发送的好友请求数（2 度 + 3 度合计）
    pub max_connection_requests: usize,
    /// 发送好友请求时最多翻页数
    pub max_search_pages: u32,
    /// 定时回复检查的间隔（小时）
    pub reply_check_interval_hours: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 9000)),
            database_path: PathBuf::from("linkedin_data/outreach.db"),
            browser_debug_port: None,
            browser_data_dir: PathBuf::from("linkedin_data/browser_context"),
            browser_visible: false,
            fast_mode: true,
            queue_poll_interval_ms: 500,
            abort_slice_ms: 500,
            search_limit: 15,
            max_connection_requests: 5,
            max_search_pages: 5,
            reply_check_interval_hours: 24,
            verbose_logging: false,
        }
    }
}

/// TOML 配置文件（所有字段可选，覆盖默认值）
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    bind_addr: Option<SocketAddr>,
    database_path: Option<PathBuf>,
    browser_debug_port: Option<u16>,
    browser_data_dir: Option<PathBuf>,
    browser_visible: Option<bool>,
    fast_mode: Option<bool>,
    queue_poll_interval_ms: Option<u64>,
    abort_slice_ms: Option<u64>,
    search_limit: Option<usize>,
    max_connection_requests: Option<usize>,
    max_search_pages: Option<u32>,
    reply_check_interval_hours: Option<u64>,
    verbose_logging: Option<bool>,
}

impl Config {
    /// 默认值 + 环境变量
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// 默认值 + 配置文件（`OUTREACH_CONFIG`，默认 `outreach.toml`，不存在则跳过）+ 环境变量
    pub fn load() -> AppResult<Self> {
        let path = std::env::var("OUTREACH_CONFIG").unwrap_or_else(|_| "outreach.toml".to_string());
        let path = Path::new(&path);
        let base = if path.exists() {
            Self::from_toml_file(path)?
        } else {
            Self::default()
        };
        Ok(base.with_env())
    }

    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("无法读取 {}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> AppResult<Self> {
        let file: FileConfig = toml::from_str(text)?;
        let default = Self::default();
        Ok(Self {
            bind_addr: file.bind_addr.unwrap_or(default.bind_addr),
            database_path: file.database_path.unwrap_or(default.database_path),
            browser_debug_port: file.browser_debug_port.or(default.browser_debug_port),
            browser_data_dir: file.browser_data_dir.unwrap_or(default.browser_data_dir),
            browser_visible: file.browser_visible.unwrap_or(default.browser_visible),
            fast_mode: file.fast_mode.unwrap_or(default.fast_mode),
            queue_poll_interval_ms: file.queue_poll_interval_ms.unwrap_or(default.queue_poll_interval_ms),
            abort_slice_ms: file.abort_slice_ms.unwrap_or(default.abort_slice_ms),
            search_limit: file.search_limit.unwrap_or(default.search_limit),
            max_connection_requests: file.max_connection_requests.unwrap_or(default.max_connection_requests),
            max_search_pages: file.max_search_pages.unwrap_or(default.max_search_pages),
            reply_check_interval_hours: file.reply_check_interval_hours.unwrap_or(default.reply_check_interval_hours),
            verbose_logging: file.verbose_logging.unwrap_or(default.verbose_logging),
        })
    }

    fn with_env(self) -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").ok().and_then(|v| v.parse().ok()).unwrap_or(self.bind_addr),
            database_path: std::env::var("DATABASE_PATH").map(PathBuf::from).unwrap_or(self.database_path),
            browser_debug_port: std::env::var("BROWSER_DEBUG_PORT").ok().and_then(|v| v.parse().ok()).or(self.browser_debug_port),
            browser_data_dir: std::env::var("BROWSER_DATA_DIR").map(PathBuf::from).unwrap_or(self.browser_data_dir),
            browser_visible: std::env::var("BROWSER_VISIBLE").ok().and_then(|v| v.parse().ok()).unwrap_or(self.browser_visible),
            fast_mode: std::env::var("FAST_MODE").ok().and_then(|v| v.parse().ok()).unwrap_or(self.fast_mode),
            queue_poll_interval_ms: std::env::var("QUEUE_POLL_INTERVAL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.queue_poll_interval_ms),
            abort_slice_ms: std::env::var("ABORT_SLICE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.abort_slice_ms),
            search_limit: std::env::var("SEARCH_LIMIT").ok().and_then(|v| v.parse().ok()).unwrap_or(self.search_limit),
            max_connection_requests: std::env::var("MAX_CONNECTION_REQUESTS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.max_connection_requests),
            max_search_pages: self.max_search_pages,
            reply_check_interval_hours: self.reply_check_interval_hours,
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(self.verbose_logging),
        }
    }

    /// 浏览器动作之间的间隔
    pub fn action_delay(&self) -> Duration {
        if self.fast_mode {
            Duration::from_millis(300)
        } else {
            Duration::from_millis(1000)
        }
    }

    pub fn queue_poll_interval(&self) -> Duration {
        Duration::from_millis(self.queue_poll_interval_ms)
    }

    pub fn abort_slice(&self) -> Duration {
        Duration::from_millis(self.abort_slice_ms)
    }

    pub fn reply_check_interval(&self) -> chrono::Duration {
        chrono::Duration::hours(self.reply_check_interval_hours as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_overrides_only_given_fields() {
        let config = Config::from_toml_str(
            r#"
            fast_mode = false
            max_connection_requests = 3
            browser_debug_port = 9222
            "#,
        )
        .unwrap();

        assert!(!config.fast_mode);
        assert_eq!(config.max_connection_requests, 3);
        assert_eq!(config.browser_debug_port, Some(9222));
        assert_eq!(config.search_limit, 15);
        assert_eq!(config.action_delay(), Duration::from_millis(1000));
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let err = Config::from_toml_str("fast_mode = \"maybe\"").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn defaults_use_fast_mode_delay() {
        let config = Config::default();
        assert_eq!(config.action_delay(), Duration::from_millis(300));
        assert_eq!(config.abort_slice(), Duration::from_millis(500));
    }
}
