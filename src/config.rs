/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 是否以无头模式启动浏览器
    pub headless: bool,
    /// 门户检索入口 URL
    pub portal_url: String,
    /// 默认检索起始日期（MM/DD/YYYY，可被任务文件和断点覆盖）
    pub start_date: String,
    /// 默认检索结束日期（MM/DD/YYYY）
    pub end_date: String,
    /// 任务输入文件（TOML）
    pub job_file: String,
    /// 断点续传标记文件（JSON，仅读取）
    pub checkpoint_file: String,
    /// 捕获文档的本地存放目录
    pub pdf_dir: String,
    /// 导出文件路径（竖线分隔文本）
    pub export_file: String,
    /// 状态输出文件
    pub status_file: String,
    /// 运行日志文件
    pub output_log_file: String,
    /// 处理行数上限（0 表示处理全部结果行）
    pub max_rows: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 托管平台对象存储基础 URL（存在即视为平台环境，启用上传）
    pub upload_base_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            headless: true,
            portal_url: "https://landrecords.example.gov/#/search".to_string(),
            start_date: "01/01/2024".to_string(),
            end_date: "01/31/2024".to_string(),
            job_file: "job.toml".to_string(),
            checkpoint_file: "checkpoint.json".to_string(),
            pdf_dir: "downloads".to_string(),
            export_file: "records_export.txt".to_string(),
            status_file: "status.txt".to_string(),
            output_log_file: "output.txt".to_string(),
            max_rows: 0,
            verbose_logging: false,
            upload_base_url: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            headless: std::env::var("HEADLESS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.headless),
            portal_url: std::env::var("PORTAL_URL").unwrap_or(default.portal_url),
            start_date: std::env::var("START_DATE").unwrap_or(default.start_date),
            end_date: std::env::var("END_DATE").unwrap_or(default.end_date),
            job_file: std::env::var("JOB_FILE").unwrap_or(default.job_file),
            checkpoint_file: std::env::var("CHECKPOINT_FILE").unwrap_or(default.checkpoint_file),
            pdf_dir: std::env::var("PDF_DIR").unwrap_or(default.pdf_dir),
            export_file: std::env::var("EXPORT_FILE").unwrap_or(default.export_file),
            status_file: std::env::var("STATUS_FILE").unwrap_or(default.status_file),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            max_rows: std::env::var("MAX_ROWS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_rows),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            upload_base_url: std::env::var("PLATFORM_UPLOAD_URL").ok().filter(|v| !v.is_empty()),
        }
    }

    /// 是否处于托管平台环境（决定是否上传导出文件和捕获文档）
    pub fn is_platform_context(&self) -> bool {
        self.upload_base_url.is_some()
    }
}
