//! 有界重试工具
//!
//! 固定退避间隔的重试循环；超出次数后返回最后一次的错误

use anyhow::{anyhow, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// 以固定退避间隔重试一个异步操作
///
/// # 参数
/// - `max_attempts`: 最大尝试次数（含第一次）
/// - `backoff`: 两次尝试之间的固定等待
/// - `label`: 用于日志的操作名称
/// - `operation`: 接收尝试序号（从 1 开始）的异步操作
///
/// # 返回
/// 第一次成功的结果；全部失败时返回最后一次的错误
pub async fn retry_with_backoff<T, F, Fut>(
    max_attempts: usize,
    backoff: Duration,
    label: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_err = None;

    for attempt in 1..=max_attempts {
        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!("✓ {} 第 {} 次尝试成功", label, attempt);
                }
                return Ok(value);
            }
            Err(e) => {
                tracing::warn!(
                    "⚠️ {} 第 {}/{} 次尝试失败: {}",
                    label,
                    attempt,
                    max_attempts,
                    e
                );
                last_err = Some(e);
                if attempt < max_attempts {
                    sleep(backoff).await;
                }
            }
        }
    }

    Err(last_err
        .unwrap_or_else(|| anyhow!("{} 未执行任何尝试", label))
        .context(format!("{} 已重试 {} 次仍然失败", label, max_attempts)))
}
