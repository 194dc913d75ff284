use std::path::Path;

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{AppError, AppResult};

/// 启动带持久化用户目录的浏览器，登录态保存在 `data_dir` 中
pub async fn launch_browser(data_dir: &Path, visible: bool, home_url: &str) -> AppResult<(Browser, Page)> {
    info!("🚀 启动浏览器（{}）...", if visible { "有界面" } else { "无头" });
    debug!("用户数据目录: {}", data_dir.display());

    std::fs::create_dir_all(data_dir)?;

    let builder = BrowserConfig::builder()
        .user_data_dir(data_dir)
        .args(vec!["--no-sandbox", "--disable-dev-shm-usage"]);
    let builder = if visible {
        builder.with_head()
    } else {
        builder.new_headless_mode()
    };
    let config = builder.build().map_err(|e| {
        error!("配置浏览器失败: {}", e);
        AppError::Browser(format!("配置浏览器失败: {}", e))
    })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        AppError::Browser(format!("启动浏览器失败: {}", e))
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser.new_page(home_url).await.map_err(|e| {
        error!("创建页面失败: {}", e);
        AppError::Browser(format!("创建页面失败: {}", e))
    })?;
    info!("✅ 浏览器已导航到: {}", home_url);

    Ok((browser, page))
}
