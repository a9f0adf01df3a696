/// 日志工具模块
///
/// 提供订阅器初始化、运行日志文件和输出格式化的辅助函数
use anyhow::Result;
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::record::RunOutcome;

/// 初始化 tracing 订阅器
///
/// 默认 info 级别，可通过 RUST_LOG 覆盖；重复初始化是无害的空操作
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化运行日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n土地登记记录抓取日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(portal_url: &str, headless: bool) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 土地登记记录抓取");
    info!("🌐 门户入口: {}", portal_url);
    info!("🖥️ 无头模式: {}", headless);
    info!("{}", "=".repeat(60));
}

/// 记录检索范围信息
pub fn log_search_range(start_date: &str, end_date: &str) {
    info!("📅 检索范围: {} ~ {}", start_date, end_date);
}

/// 记录行处理开始
pub fn log_row_start(row_index: usize, total: usize) {
    info!("\n{}", "─".repeat(30));
    info!("📄 处理第 {}/{} 行", row_index, total);
}

/// 打印最终统计信息
pub fn print_final_stats(outcome: &RunOutcome, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", outcome.succeeded, outcome.total_attempted);
    info!("❌ 失败: {}", outcome.failed);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
