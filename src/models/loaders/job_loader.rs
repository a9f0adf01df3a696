use crate::models::record::SearchRange;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

/// 任务输入文件的结构（start_date / end_date 为 MM/DD/YYYY 文本）
#[derive(Debug, Clone, Deserialize)]
struct JobInput {
    start_date: String,
    end_date: String,
}

/// 从 TOML 任务文件加载检索日期范围
///
/// 文件不存在时返回 None（调用方回退到配置默认值）；
/// 文件存在但无法解析时返回错误
pub async fn load_job_file(job_file_path: &str) -> Result<Option<SearchRange>> {
    let path = Path::new(job_file_path);
    if !path.exists() {
        tracing::debug!("任务文件不存在: {}，使用配置默认范围", job_file_path);
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取任务文件: {}", job_file_path))?;

    let job: JobInput = toml::from_str(&content)
        .with_context(|| format!("无法解析任务文件: {}", job_file_path))?;

    tracing::info!("✓ 已加载任务文件: {}", job_file_path);
    Ok(Some(SearchRange::new(job.start_date, job.end_date)))
}
