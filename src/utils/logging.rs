/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化全局日志订阅者
///
/// 默认级别为 `info`，可通过 `RUST_LOG` 覆盖。重复调用不会报错。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 Quiz 服务启动 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🌐 监听地址: {}", config.bind_addr);
    info!(
        "⏱️ 时间预算: {}s (重试余量 {}s, 链式余量 {}s)",
        config.max_time_secs, config.retry_margin_secs, config.chain_margin_secs
    );
    info!(
        "🤖 LLM: {} ({})",
        config.llm_model_name,
        if config.llm_api_key.is_some() {
            "已配置"
        } else {
            "未配置 API Key"
        }
    );
    info!("🖥️ 无头模式: {}", config.headless);
    info!("{}", "=".repeat(60));
}

/// 耗时格式化为一位小数的秒数
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.1}s", elapsed.as_secs_f64())
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
