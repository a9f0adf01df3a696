//! 行提取状态机 - 流程层
//!
//! 核心职责：定义"一个结果行"的完整处理流程
//!
//! 单行状态严格按序推进，行与行之间不重叠：
//! 折叠 → 展开中 → 已展开&提取中 → 捕获文档（可选）→ 折叠中 → 折叠
//!
//! 顺序是硬性不变量：乱序访问会读到陈旧或不存在的 DOM 状态

use anyhow::{Context, Result};
use tokio::time::Duration;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::ScrapeError;
use crate::infrastructure::JsExecutor;
use crate::models::record::RecordEntry;
use crate::services::document_capture::DocumentCapture;
use crate::services::dom_query;
use crate::workflow::row_ctx::RowCtx;

/// 详情区块和字段键（按区块头文本定位，不是选择器）
const SECTION_DETAILS: &str = "Document Details";
const LABEL_CONSIDERATION: &str = "Consideration";
const LABEL_NOTES: &str = "Notes";
const SECTION_PARTIES: &str = "Parties";
const MARKER_PARTY1: &str = "Party 1";
const MARKER_PARTY2: &str = "Party 2";
const SECTION_ASSOCIATED: &str = "Associated Documents";
const SECTION_LEGAL: &str = "Legal Description";

/// 展开遮罩等待上限
const OVERLAY_TIMEOUT: Duration = Duration::from_secs(15);
/// 详情面板出现的等待上限（超时是行级失败，不是运行级失败）
const EXPAND_TIMEOUT: Duration = Duration::from_secs(10);
/// 折叠后的隐藏等待上限（短暂，失败不致命）
const COLLAPSE_TIMEOUT: Duration = Duration::from_secs(3);

/// 行处理流程
///
/// - 编排单行的展开 / 提取 / 捕获 / 折叠
/// - 不持有任何资源（page）
/// - 只依赖业务能力（services）
pub struct RowFlow {
    capture: DocumentCapture,
    verbose_logging: bool,
}

impl RowFlow {
    /// 创建新的行处理流程
    pub fn new(config: &Config) -> Self {
        Self {
            capture: DocumentCapture::new(config),
            verbose_logging: config.verbose_logging,
        }
    }

    /// 处理一个结果行，返回完整填充的记录
    ///
    /// 无论中途成败，折叠总会被尝试，保证下一行面对的是折叠状态
    pub async fn run(&self, executor: &JsExecutor, ctx: &RowCtx) -> Result<RecordEntry> {
        let result = self.process(executor, ctx).await;
        self.collapse(executor, ctx).await;
        result
    }

    async fn process(&self, executor: &JsExecutor, ctx: &RowCtx) -> Result<RecordEntry> {
        self.expand(executor, ctx).await?;

        let mut record = self.extract(executor, ctx).await?;

        // 文档检查：图标可见才进入捕获；捕获结果原样存入（含空串）
        if dom_query::is_visible(executor, &ctx.document_icon_selector()).await {
            record.pdf_location = self.capture.capture(executor, &record.document_no).await;
        } else {
            debug!("{} 无文档图标，跳过捕获", ctx);
        }

        Ok(record)
    }

    /// 展开：等遮罩 → 点摘要 → 等详情面板
    async fn expand(&self, executor: &JsExecutor, ctx: &RowCtx) -> Result<()> {
        dom_query::wait_for_overlay_clear(executor, OVERLAY_TIMEOUT)
            .await
            .with_context(|| format!("{} 展开前遮罩未消失", ctx))?;

        dom_query::robust_click(executor, &ctx.summary_selector())
            .await
            .with_context(|| format!("{} 摘要点击失败", ctx))?;

        dom_query::wait_for_visible(executor, &ctx.detail_selector(), EXPAND_TIMEOUT)
            .await
            .map_err(|_| ScrapeError::expand_timeout(ctx.row_index))?;

        debug!("{} 详情面板已展开", ctx);
        Ok(())
    }

    /// 提取：把渲染出的字段映射成一条记录
    async fn extract(&self, executor: &JsExecutor, ctx: &RowCtx) -> Result<RecordEntry> {
        // 行的可见标识；为空违反记录不变量，该行按失败处理
        let document_no = dom_query::element_text(executor, &ctx.document_no_selector()).await?;
        if document_no.is_empty() {
            return Err(ScrapeError::missing_document_no(ctx.row_index).into());
        }

        let mut record = RecordEntry::with_document_no(document_no);

        // 两个"主要内容"按位置取义：第一个恒为登记日期，第二个恒为类型
        let primary = self.primary_values(executor, ctx).await?;
        record.recorded_date = primary.first().cloned().unwrap_or_default();
        record.document_type = primary.get(1).cloned().unwrap_or_default();

        let scope = ctx.detail_selector();

        record.consideration =
            dom_query::find_section_value(executor, &scope, SECTION_DETAILS, LABEL_CONSIDERATION)
                .await?;
        record.notes =
            dom_query::find_section_value(executor, &scope, SECTION_DETAILS, LABEL_NOTES).await?;

        record.party1 =
            dom_query::collect_sublist_after_marker(executor, &scope, SECTION_PARTIES, MARKER_PARTY1)
                .await?;
        record.party2 =
            dom_query::collect_sublist_after_marker(executor, &scope, SECTION_PARTIES, MARKER_PARTY2)
                .await?;

        record.associated_documents =
            dom_query::collect_section_items(executor, &scope, SECTION_ASSOCIATED).await?;
        record.legals = dom_query::collect_section_items(executor, &scope, SECTION_LEGAL).await?;

        if self.verbose_logging {
            self.log_record(ctx, &record);
        }

        info!("{} ✓ 提取完成: {}", ctx, record.document_no);
        Ok(record)
    }

    /// 读取行详情里的"主要内容"值（保持位置，不丢空项）
    async fn primary_values(&self, executor: &JsExecutor, ctx: &RowCtx) -> Result<Vec<String>> {
        let js_code = format!(
            r#"
            (() => {{
                const root = document.querySelector({scope});
                if (!root) return [];
                return Array.from(root.querySelectorAll('.primary-content .primary-value'))
                    .map(e => e.textContent);
            }})()
            "#,
            scope = serde_json::to_string(&ctx.detail_selector())?
        );

        let raw: Vec<String> = executor.eval_as(js_code).await?;
        Ok(raw.into_iter().map(|t| t.trim().to_string()).collect())
    }

    /// 折叠：重新点击摘要关闭详情
    ///
    /// 框架重渲染后详情节点可能保留在 DOM 中，隐藏状态缺失不能
    /// 证明折叠失败，所以隐藏等待失败只记日志
    async fn collapse(&self, executor: &JsExecutor, ctx: &RowCtx) {
        if let Err(e) = dom_query::robust_click(executor, &ctx.summary_selector()).await {
            debug!("{} 折叠点击失败: {}", ctx, e);
            return;
        }

        if let Err(e) =
            dom_query::wait_for_hidden(executor, &ctx.detail_selector(), COLLAPSE_TIMEOUT).await
        {
            debug!("{} 详情面板未进入隐藏状态: {}", ctx, e);
        }
    }

    // ========== 日志辅助方法 ==========

    fn log_record(&self, ctx: &RowCtx, record: &RecordEntry) {
        info!(
            "{} 字段: 日期={} 类型={} 当事人1={} 当事人2={} 关联={} 地块={}",
            ctx,
            record.recorded_date,
            record.document_type,
            record.party1.len(),
            record.party2.len(),
            record.associated_documents.len(),
            record.legals.len()
        );
    }
}
