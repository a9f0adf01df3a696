use serde::{Deserialize, Serialize};

/// 日期的固定文本格式（门户的检索表单使用 MM/DD/YYYY）
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// 检索日期范围
///
/// 仅在提交检索之前可变；提交后不再修改
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRange {
    pub start_date: String,
    pub end_date: String,
}

impl SearchRange {
    pub fn new(start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        Self {
            start_date: start_date.into(),
            end_date: end_date.into(),
        }
    }
}

impl std::fmt::Display for SearchRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ~ {}", self.start_date, self.end_date)
    }
}

/// 一条土地登记记录（对应门户中的一个结果行，已展平）
///
/// 每行创建一次，交给导出环节之前完整填充，之后不再修改
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordEntry {
    /// 文档编号（行内可见标识，同时作为捕获键和文件名种子，非空）
    pub document_no: String,
    /// 登记日期
    pub recorded_date: String,
    /// 文档类型
    pub document_type: String,
    /// 对价金额
    pub consideration: String,
    /// 备注
    pub notes: String,
    /// 第一方当事人列表（DOM 顺序）
    pub party1: Vec<String>,
    /// 第二方当事人列表（DOM 顺序）
    pub party2: Vec<String>,
    /// 关联文档列表
    pub associated_documents: Vec<String>,
    /// 地块描述列表
    pub legals: Vec<String>,
    /// 文档位置：本地路径、外部 URL，或空字符串（未尝试/失败的哨兵值，不用 null）
    pub pdf_location: String,
}

impl RecordEntry {
    /// 以文档编号创建一条空记录
    pub fn with_document_no(document_no: impl Into<String>) -> Self {
        Self {
            document_no: document_no.into(),
            ..Default::default()
        }
    }
}

/// 运行结果统计
///
/// 仅用于最终状态汇报
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub total_attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl RunOutcome {
    pub fn record_success(&mut self) {
        self.total_attempted += 1;
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self) {
        self.total_attempted += 1;
        self.failed += 1;
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "尝试 {} 行, 成功 {}, 失败 {}",
            self.total_attempted, self.succeeded, self.failed
        )
    }
}

/// 断点续传标记（仅由本核心读取，写入属于外部状态存储的职责）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeCheckpoint {
    /// 外部状态存储使用驼峰键名
    #[serde(alias = "lastProcessedDate")]
    pub last_processed_date: String,
}
