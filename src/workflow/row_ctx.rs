//! 行处理上下文
//!
//! 封装"我正在处理第几行"这一信息，并派生该行的作用域选择器

use std::fmt::Display;

/// 行处理上下文
///
/// 行没有稳定标识，只能按列表中的位置（从 1 开始）定位
#[derive(Debug, Clone)]
pub struct RowCtx {
    /// 行索引（从 1 开始）
    pub row_index: usize,

    /// 本次运行的结果行总数（仅用于日志显示）
    pub total_rows: usize,
}

impl RowCtx {
    /// 创建新的行上下文
    pub fn new(row_index: usize, total_rows: usize) -> Self {
        Self {
            row_index,
            total_rows,
        }
    }

    /// 该行的根选择器
    pub fn row_selector(&self) -> String {
        format!(
            ".result-list .search-result-row:nth-child({})",
            self.row_index
        )
    }

    /// 行摘要（点击展开/折叠的目标）
    pub fn summary_selector(&self) -> String {
        format!("{} .row-summary", self.row_selector())
    }

    /// 展开后的详情面板
    pub fn detail_selector(&self) -> String {
        format!("{} .row-detail", self.row_selector())
    }

    /// 行的主标识控件（文档编号）
    pub fn document_no_selector(&self) -> String {
        format!("{} .document-number", self.row_selector())
    }

    /// 文档图像指示图标（可见即表示该行带附件）
    pub fn document_icon_selector(&self) -> String {
        format!("{} .document-image-icon", self.row_selector())
    }
}

impl Display for RowCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[行 {}/{}]", self.row_index, self.total_rows)
    }
}
