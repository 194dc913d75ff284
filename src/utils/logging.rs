/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::infrastructure::SessionSnapshot;

/// 初始化 tracing 日志
///
/// `RUST_LOG` 优先；否则 `verbose` 为真时默认 debug，为假时默认 info。
/// 重复调用不会报错（测试中可能多次初始化）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - LinkedIn 联系人工作流");
    info!("🌐 监听地址: {}", config.bind_addr);
    info!("🗄️ 数据库: {}", config.database_path.display());
    match config.browser_debug_port {
        Some(port) => info!("🔌 连接已有浏览器，调试端口: {}", port),
        None => info!("🖥️ 启动浏览器，用户目录: {}", config.browser_data_dir.display()),
    }
    info!(
        "⏱️ 动作间隔: {:?}，好友请求上限: {}",
        config.action_delay(),
        config.max_connection_requests
    );
    info!("{}", "=".repeat(60));
}

/// 记录启动恢复结果
pub fn log_recovery(recovered: usize) {
    if recovered > 0 {
        info!("\n{}", "─".repeat(60));
        info!("♻️ {} 个任务在上次运行中被中断，已标记为失败", recovered);
        info!("💡 可通过重试从中断的步骤继续");
        info!("{}", "─".repeat(60));
    }
}

/// 记录浏览器会话状态
pub fn log_session(snapshot: &SessionSnapshot) {
    info!(
        "🔒 当前任务: {:?}，排队: {:?}",
        snapshot.current_job_id, snapshot.queued_jobs
    );
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
