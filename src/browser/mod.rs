//! 浏览器层：启动或连接浏览器，以及 LinkedIn 页面自动化

pub mod connection;
pub mod launcher;
pub mod linkedin;
pub mod surface;

use chromiumoxide::{Browser, Page};

use crate::config::Config;
use crate::error::AppResult;

pub use linkedin::LinkedInSurface;
pub use surface::{BrowserAutomationSurface, ConnectOutcome, ReplyCheck, ReplyProbe};

pub const LINKEDIN_HOME: &str = "https://www.linkedin.com/feed/";

/// 配置了调试端口时连接已有浏览器，否则自行启动
pub async fn open_browser(config: &Config) -> AppResult<(Browser, Page)> {
    match config.browser_debug_port {
        Some(port) => connection::connect_to_browser(port, LINKEDIN_HOME).await,
        None => launcher::launch_browser(&config.browser_data_dir, config.browser_visible, LINKEDIN_HOME).await,
    }
}
