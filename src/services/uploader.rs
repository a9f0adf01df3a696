//! 对象存储上传 - 业务能力层
//!
//! 仅在托管平台环境下启用；上传后返回可推导的检索 URL

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{ExportError, ScrapeError};

/// 对象存储上传客户端
pub struct Uploader {
    client: reqwest::Client,
    base_url: String,
}

impl Uploader {
    /// 创建上传客户端
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// 从配置创建；非平台环境返回 None
    pub fn from_config(config: &Config) -> Option<Self> {
        config.upload_base_url.as_deref().map(Self::new)
    }

    /// 上传字节并返回外部引用 URL
    pub async fn upload_bytes(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        let url = format!("{}/{}", self.base_url, key);
        debug!("正在上传 {} 字节到 {}", bytes.len(), url);

        let response = self
            .client
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| {
                ScrapeError::Export(ExportError::UploadFailed {
                    url: url.clone(),
                    source: Box::new(e),
                })
            })?;

        response.error_for_status().map_err(|e| {
            ScrapeError::Export(ExportError::UploadFailed {
                url: url.clone(),
                source: Box::new(e),
            })
        })?;

        info!("✓ 已上传: {}", url);
        Ok(url)
    }

    /// 上传本地文件
    pub async fn upload_file(&self, key: &str, path: &str, content_type: &str) -> Result<String> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("无法读取待上传文件: {}", path))?;
        self.upload_bytes(key, bytes, content_type).await
    }
}
