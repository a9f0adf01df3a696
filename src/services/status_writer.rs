//! 状态输出 - 业务能力层
//!
//! 把粗粒度进度语句追加到状态文件并镜像到日志。
//! 进度语句是给外部看的，不参与控制流

use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use tracing::info;

/// 状态输出服务
///
/// 职责：
/// - 追加进度行
/// - 写终止状态（每次运行恰好一条，由编排层保证）
pub struct StatusWriter {
    status_file_path: String,
}

impl StatusWriter {
    /// 创建状态输出服务
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            status_file_path: path.into(),
        }
    }

    /// 追加一条进度语句
    pub fn write(&self, message: &str) -> Result<()> {
        info!("📣 {}", message);
        self.append_line(message)
    }

    /// 写终止状态（成功或致命信息的最终汇总行）
    pub fn terminal(&self, message: &str) -> Result<()> {
        info!("🏁 {}", message);
        self.append_line(&format!("TERMINAL: {}", message))
    }

    fn append_line(&self, message: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.status_file_path)?;

        let line = format!(
            "[{}] {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            message
        );
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}
