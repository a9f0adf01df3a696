use std::fmt;

/// 抓取流程错误类型
///
/// 传播策略：在能保住批处理进度的最窄作用域内处理——
/// 只有会话启动失败和检索重试耗尽会上抛到顶层并终止整个运行
#[derive(Debug)]
pub enum ScrapeError {
    /// 会话启动错误（致命，终止运行）
    Init(InitError),
    /// 检索提交错误（重试 3 次后致命）
    Search(SearchError),
    /// 单行处理错误（行边界捕获，批处理继续）
    Row(RowError),
    /// 文档捕获错误（捕获内部消化，行继续）
    Capture(CaptureError),
    /// 断点读取错误（记录后忽略，使用完整范围）
    Checkpoint(CheckpointError),
    /// 导出错误
    Export(ExportError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrapeError::Init(e) => write!(f, "会话错误: {}", e),
            ScrapeError::Search(e) => write!(f, "检索错误: {}", e),
            ScrapeError::Row(e) => write!(f, "行处理错误: {}", e),
            ScrapeError::Capture(e) => write!(f, "文档捕获错误: {}", e),
            ScrapeError::Checkpoint(e) => write!(f, "断点错误: {}", e),
            ScrapeError::Export(e) => write!(f, "导出错误: {}", e),
            ScrapeError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for ScrapeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScrapeError::Init(e) => Some(e),
            ScrapeError::Search(e) => Some(e),
            ScrapeError::Row(e) => Some(e),
            ScrapeError::Capture(e) => Some(e),
            ScrapeError::Checkpoint(e) => Some(e),
            ScrapeError::Export(e) => Some(e),
            ScrapeError::Other(_) => None,
        }
    }
}

/// 会话启动错误
#[derive(Debug)]
pub enum InitError {
    /// 浏览器配置构建失败
    ConfigurationFailed {
        message: String,
    },
    /// 浏览器启动失败（首选渠道和回退引擎均失败）
    LaunchFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 创建页面失败
    PageCreationFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::ConfigurationFailed { message } => {
                write!(f, "浏览器配置失败: {}", message)
            }
            InitError::LaunchFailed { source } => {
                write!(f, "浏览器启动失败（回退引擎也不可用）: {}", source)
            }
            InitError::PageCreationFailed { source } => {
                write!(f, "创建页面失败: {}", source)
            }
        }
    }
}

impl std::error::Error for InitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InitError::LaunchFailed { source } | InitError::PageCreationFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            InitError::ConfigurationFailed { .. } => None,
        }
    }
}

/// 检索提交错误
#[derive(Debug)]
pub enum SearchError {
    /// 导航失败
    NavigationFailed {
        url: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 控件始终不可交互
    ControlNotInteractable {
        selector: String,
    },
    /// 提交后网络静默等待超时（结果列表始终未挂载）
    QuiescenceTimeout {
        waited_secs: u64,
    },
    /// 重试次数耗尽
    RetriesExhausted {
        attempts: usize,
    },
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::NavigationFailed { url, source } => {
                write!(f, "导航到 {} 失败: {}", url, source)
            }
            SearchError::ControlNotInteractable { selector } => {
                write!(f, "控件不可交互: {}", selector)
            }
            SearchError::QuiescenceTimeout { waited_secs } => {
                write!(f, "提交后等待结果列表超时（{} 秒）", waited_secs)
            }
            SearchError::RetriesExhausted { attempts } => {
                write!(f, "检索提交已重试 {} 次仍然失败", attempts)
            }
        }
    }
}

impl std::error::Error for SearchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SearchError::NavigationFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 单行处理错误
#[derive(Debug)]
pub enum RowError {
    /// 展开后详情面板始终未出现
    ExpandTimeout {
        row_index: usize,
    },
    /// 行的可见标识为空（违反 RecordEntry 不变量）
    MissingDocumentNo {
        row_index: usize,
    },
    /// 字段提取失败
    ExtractFailed {
        row_index: usize,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowError::ExpandTimeout { row_index } => {
                write!(f, "第 {} 行展开超时", row_index)
            }
            RowError::MissingDocumentNo { row_index } => {
                write!(f, "第 {} 行缺少文档编号", row_index)
            }
            RowError::ExtractFailed { row_index, source } => {
                write!(f, "第 {} 行字段提取失败: {}", row_index, source)
            }
        }
    }
}

impl std::error::Error for RowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RowError::ExtractFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 文档捕获错误
#[derive(Debug)]
pub enum CaptureError {
    /// 未找到匹配该文档编号的打开控件
    OpenControlNotFound {
        document_no: String,
    },
    /// 文档查看器画布未出现
    ViewerTimeout,
    /// 打印拦截安装失败
    InterceptionFailed,
    /// 打印选项对话框未出现
    DialogTimeout,
    /// 对话框中控件操作失败
    DialogControlFailed {
        control: String,
    },
    /// 打印 iframe 未挂载
    FrameTimeout {
        waited_secs: u64,
    },
    /// iframe 的 src 不是同进程二进制对象引用
    NotBlobSource {
        src: String,
    },
    /// 页面内取字节失败
    FetchFailed {
        message: String,
    },
    /// base64 解码失败
    DecodeFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 本地写入失败
    PersistFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::OpenControlNotFound { document_no } => {
                write!(f, "未找到文档 {} 的打开控件", document_no)
            }
            CaptureError::ViewerTimeout => write!(f, "文档查看器未出现"),
            CaptureError::InterceptionFailed => write!(f, "打印拦截安装失败"),
            CaptureError::DialogTimeout => write!(f, "打印选项对话框未出现"),
            CaptureError::DialogControlFailed { control } => {
                write!(f, "对话框控件操作失败: {}", control)
            }
            CaptureError::FrameTimeout { waited_secs } => {
                write!(f, "打印 iframe 未挂载（等待 {} 秒）", waited_secs)
            }
            CaptureError::NotBlobSource { src } => {
                write!(f, "iframe 源不是 blob 引用: {}", src)
            }
            CaptureError::FetchFailed { message } => {
                write!(f, "页面内取字节失败: {}", message)
            }
            CaptureError::DecodeFailed { source } => {
                write!(f, "base64 解码失败: {}", source)
            }
            CaptureError::PersistFailed { path, source } => {
                write!(f, "写入文件失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaptureError::DecodeFailed { source } | CaptureError::PersistFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 断点读取错误
#[derive(Debug)]
pub enum CheckpointError {
    /// 文件读取失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// JSON 解析失败
    ParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 日期文本无法解析
    BadDate {
        value: String,
    },
}

impl fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointError::ReadFailed { path, source } => {
                write!(f, "读取断点文件失败 ({}): {}", path, source)
            }
            CheckpointError::ParseFailed { path, source } => {
                write!(f, "解析断点文件失败 ({}): {}", path, source)
            }
            CheckpointError::BadDate { value } => {
                write!(f, "断点日期无法解析: {}", value)
            }
        }
    }
}

impl std::error::Error for CheckpointError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CheckpointError::ReadFailed { source, .. }
            | CheckpointError::ParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            CheckpointError::BadDate { .. } => None,
        }
    }
}

/// 导出错误
#[derive(Debug)]
pub enum ExportError {
    /// 写入导出文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 上传到对象存储失败
    UploadFailed {
        url: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::WriteFailed { path, source } => {
                write!(f, "写入导出文件失败 ({}): {}", path, source)
            }
            ExportError::UploadFailed { url, source } => {
                write!(f, "上传失败 ({}): {}", url, source)
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::WriteFailed { source, .. } | ExportError::UploadFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
        }
    }
}

// ========== 从常见错误类型转换 ==========
// 注意：anyhow 已经为所有实现了 std::error::Error 的类型提供了自动包装，
// 这里只补充本 crate 内部需要的几个直接转换

impl From<chromiumoxide::error::CdpError> for ScrapeError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        ScrapeError::Other(format!("浏览器协议错误: {}", err))
    }
}

impl From<serde_json::Error> for ScrapeError {
    fn from(err: serde_json::Error) -> Self {
        ScrapeError::Other(format!("JSON 错误: {}", err))
    }
}

impl From<std::io::Error> for ScrapeError {
    fn from(err: std::io::Error) -> Self {
        ScrapeError::Other(format!("IO 错误: {}", err))
    }
}

// ========== 便捷构造函数 ==========

impl ScrapeError {
    /// 创建浏览器启动失败错误
    pub fn launch_failed(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        ScrapeError::Init(InitError::LaunchFailed {
            source: Box::new(source),
        })
    }

    /// 创建控件不可交互错误
    pub fn control_not_interactable(selector: impl Into<String>) -> Self {
        ScrapeError::Search(SearchError::ControlNotInteractable {
            selector: selector.into(),
        })
    }

    /// 创建检索静默等待超时错误
    pub fn quiescence_timeout(waited_secs: u64) -> Self {
        ScrapeError::Search(SearchError::QuiescenceTimeout { waited_secs })
    }

    /// 创建行展开超时错误
    pub fn expand_timeout(row_index: usize) -> Self {
        ScrapeError::Row(RowError::ExpandTimeout { row_index })
    }

    /// 创建文档编号缺失错误
    pub fn missing_document_no(row_index: usize) -> Self {
        ScrapeError::Row(RowError::MissingDocumentNo { row_index })
    }

    /// 创建非 blob 源错误
    pub fn not_blob_source(src: impl Into<String>) -> Self {
        ScrapeError::Capture(CaptureError::NotBlobSource { src: src.into() })
    }
}

// ========== Result 类型别名 ==========

/// 抓取流程结果类型
pub type ScrapeResult<T> = Result<T, ScrapeError>;
