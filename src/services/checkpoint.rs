//! 断点续传读取 - 业务能力层
//!
//! 只读：外部状态存储记录上次处理到的日期，本核心在启动时读一次，
//! 有效起始日期取断点日期的次日。读取或解析失败不致命——记一条
//! 日志后使用配置的完整范围。

use anyhow::Result;
use chrono::NaiveDate;
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

use crate::error::{CheckpointError, ScrapeError};
use crate::models::record::{ResumeCheckpoint, DATE_FORMAT};

/// 结合断点计算有效起始日期
///
/// 断点存在且可解析时返回断点次日，否则返回配置的起始日期
pub async fn effective_start_date(checkpoint_path: &str, configured_start: &str) -> String {
    match read_checkpoint(checkpoint_path).await {
        Ok(Some(last_processed)) => match advance_one_day(&last_processed) {
            Some(next) => {
                info!("🔖 发现断点 {}，从 {} 继续", last_processed, next);
                next
            }
            None => {
                warn!(
                    "⚠️ 断点日期无法解析: {}，使用完整范围",
                    last_processed
                );
                configured_start.to_string()
            }
        },
        Ok(None) => configured_start.to_string(),
        Err(e) => {
            warn!("⚠️ 断点读取失败: {}，使用完整范围", e);
            configured_start.to_string()
        }
    }
}

/// 读取断点文件
///
/// 文件不存在返回 None（首次运行的正常情况）
async fn read_checkpoint(checkpoint_path: &str) -> Result<Option<String>> {
    if !Path::new(checkpoint_path).exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(checkpoint_path).await.map_err(|e| {
        ScrapeError::Checkpoint(CheckpointError::ReadFailed {
            path: checkpoint_path.to_string(),
            source: Box::new(e),
        })
    })?;

    let checkpoint: ResumeCheckpoint = serde_json::from_str(&content).map_err(|e| {
        ScrapeError::Checkpoint(CheckpointError::ParseFailed {
            path: checkpoint_path.to_string(),
            source: Box::new(e),
        })
    })?;

    Ok(Some(checkpoint.last_processed_date))
}

/// 日期加一天（MM/DD/YYYY），无法解析返回 None
pub fn advance_one_day(date_text: &str) -> Option<String> {
    let date = NaiveDate::parse_from_str(date_text, DATE_FORMAT).ok()?;
    let next = date.checked_add_days(chrono::Days::new(1))?;
    Some(next.format(DATE_FORMAT).to_string())
}
