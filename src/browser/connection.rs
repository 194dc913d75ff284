use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{AppError, AppResult};

/// 连接到已启动的浏览器（`--remote-debugging-port`），复用已打开的 LinkedIn 标签页
pub async fn connect_to_browser(port: u16, home_url: &str) -> AppResult<(Browser, Page)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        AppError::Browser(format!("连接 {} 失败: {}", browser_url, e))
    })?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let pages = browser
        .pages()
        .await
        .map_err(|e| AppError::Browser(format!("获取页面列表失败: {}", e)))?;
    debug!("获取到 {} 个页面", pages.len());

    for p in pages.iter() {
        if let Ok(Some(url)) = p.url().await {
            if url.contains("linkedin.com") {
                info!("✓ 复用 LinkedIn 页面: {}", url);
                return Ok((browser, p.clone()));
            }
        }
    }

    debug!("未找到 LinkedIn 页面，将创建新页面");
    let page = browser.new_page(home_url).await.map_err(|e| {
        error!("创建新页面失败: {}", e);
        AppError::Browser(format!("创建页面失败: {}", e))
    })?;
    info!("已导航到: {}", home_url);

    Ok((browser, page))
}
