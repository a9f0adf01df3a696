//! 记录导出 - 业务能力层
//!
//! 流式写入分隔文本：每成功一行立即追加并落盘，
//! 崩溃时已写出的记录不丢（不在批处理结束时才缓冲写出）

use anyhow::Result;
use csv::{Writer, WriterBuilder};
use std::fs::{File, OpenOptions};
use tracing::{debug, info};

use crate::error::{ExportError, ScrapeError};
use crate::models::record::RecordEntry;

/// 字段分隔符（非逗号，字段里常见逗号）
const FIELD_DELIMITER: u8 = b'|';
/// 多值字段内部的条目分隔符
const LIST_SEPARATOR: &str = ";";

/// 导出文件表头
pub const EXPORT_HEADER: [&str; 10] = [
    "document_no",
    "recorded_date",
    "document_type",
    "consideration",
    "notes",
    "party1",
    "party2",
    "associated_documents",
    "legals",
    "pdf_location",
];

/// 记录导出器
///
/// 职责：
/// - 只负责"写一条记录"能力
/// - 不认识行循环 / 浏览器
pub struct RecordExporter {
    writer: Writer<File>,
    path: String,
}

impl RecordExporter {
    /// 创建导出文件并写入表头
    pub fn create(path: &str) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|e| write_failed(path, e))?;

        let mut writer = WriterBuilder::new()
            .delimiter(FIELD_DELIMITER)
            .from_writer(file);

        writer
            .write_record(EXPORT_HEADER)
            .map_err(|e| write_failed(path, e))?;
        writer.flush().map_err(|e| write_failed(path, e))?;

        info!("📝 导出文件已创建: {}", path);
        Ok(Self {
            writer,
            path: path.to_string(),
        })
    }

    /// 追加一条记录并立即落盘
    pub fn append(&mut self, record: &RecordEntry) -> Result<()> {
        self.writer
            .write_record(record_fields(record))
            .map_err(|e| write_failed(&self.path, e))?;
        self.writer
            .flush()
            .map_err(|e| write_failed(&self.path, e))?;

        debug!("已导出记录: {}", record.document_no);
        Ok(())
    }

    /// 导出文件路径
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// 把一条记录展平成导出字段（与 EXPORT_HEADER 对齐）
pub fn record_fields(record: &RecordEntry) -> [String; 10] {
    [
        record.document_no.clone(),
        record.recorded_date.clone(),
        record.document_type.clone(),
        record.consideration.clone(),
        record.notes.clone(),
        join_list(&record.party1),
        join_list(&record.party2),
        join_list(&record.associated_documents),
        join_list(&record.legals),
        record.pdf_location.clone(),
    ]
}

/// 多值字段序列化：条目按分号拼接
pub fn join_list(items: &[String]) -> String {
    items.join(LIST_SEPARATOR)
}

/// 多值字段反序列化（导出格式的逆向，供校验使用）
pub fn split_list(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split(LIST_SEPARATOR).map(|s| s.to_string()).collect()
}

fn write_failed(path: &str, source: impl std::error::Error + Send + Sync + 'static) -> anyhow::Error {
    ScrapeError::Export(ExportError::WriteFailed {
        path: path.to_string(),
        source: Box::new(source),
    })
    .into()
}
