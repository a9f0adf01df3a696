//! 流水线编排 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，按序推进一次完整运行：
//!
//! 1. **会话启动**：启动浏览器，创建 JsExecutor
//! 2. **范围确定**：任务文件 → 配置默认 → 断点调整（读取失败不致命）
//! 3. **检索提交**：委托检索控制器，带重试
//! 4. **行循环**：对每个结果行运行行状态机，行边界捕获失败
//! 5. **流式导出**：每成功一行立即推给导出环节
//! 6. **收尾**：最终统计、终止状态（恰好一条）、会话释放
//!
//! ## 设计特点
//!
//! - **资源所有者**：唯一持有 Session 的模块，所有退出路径都释放
//! - **失败隔离**：单行失败只增加失败计数，批处理继续
//! - **向下委托**：把单行细节委托给 RowFlow

use anyhow::Result;
use tracing::{error, info, warn};

use crate::browser::Session;
use crate::config::Config;
use crate::infrastructure::JsExecutor;
use crate::models::record::{RunOutcome, SearchRange};
use crate::models::load_job_file;
use crate::services::checkpoint;
use crate::services::dom_query;
use crate::services::record_export::RecordExporter;
use crate::services::search;
use crate::services::status_writer::StatusWriter;
use crate::services::uploader::Uploader;
use crate::utils::logging;
use crate::workflow::{RowCtx, RowFlow};

/// 应用主结构
pub struct App {
    config: Config,
    session: Session,
    executor: JsExecutor,
    status: StatusWriter,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化运行日志文件
        logging::init_log_file(&config.output_log_file)?;

        logging::log_startup(&config.portal_url, config.headless);

        // 启动浏览器会话（唯一的启动重试在 Session 内部）
        let session = Session::start(config.headless).await?;

        // 创建 JsExecutor（持有 page）
        let executor = JsExecutor::new(session.page().clone());

        let status = StatusWriter::new(&config.status_file);

        Ok(Self {
            config,
            session,
            executor,
            status,
        })
    }

    /// 运行应用主逻辑
    ///
    /// 终止状态每次运行恰好一条（成功或致命信息）；
    /// 会话在所有退出路径上释放
    pub async fn run(self) -> Result<()> {
        let App {
            config,
            session,
            executor,
            status,
        } = self;

        let result = execute(&config, &executor, &status).await;

        match &result {
            Ok(message) => {
                if let Err(e) = status.terminal(message) {
                    warn!("终止状态写入失败: {}", e);
                }
            }
            Err(e) => {
                if let Err(write_err) = status.terminal(&format!("运行失败: {:#}", e)) {
                    warn!("终止状态写入失败: {}", write_err);
                }
            }
        }

        session.stop().await;

        result.map(|_| ())
    }
}

/// 执行主流程，返回成功时的终止状态文本
async fn execute(config: &Config, executor: &JsExecutor, status: &StatusWriter) -> Result<String> {
    let _ = status.write("运行开始");

    let range = resolve_search_range(config).await;
    logging::log_search_range(&range.start_date, &range.end_date);
    let _ = status.write(&format!("检索范围: {}", range));

    // 检索提交（3 次重试在控制器内部；耗尽即致命）
    search::submit_with_retry(executor, &config.portal_url, &range).await?;

    let total_rows = dom_query::element_count(executor, dom_query::SEL_RESULT_ROWS).await?;
    info!("📋 找到 {} 个结果行", total_rows);

    if total_rows == 0 {
        // 零结果：不创建导出文件，直接以"无记录"终止
        return Ok("未找到记录".to_string());
    }

    let effective_rows = effective_row_count(config, total_rows);

    let mut exporter = RecordExporter::create(&config.export_file)?;
    let flow = RowFlow::new(config);
    let mut outcome = RunOutcome::default();

    // ========== 行循环（严格串行，行边界捕获失败） ==========
    for row_index in 1..=effective_rows {
        logging::log_row_start(row_index, effective_rows);
        let _ = status.write(&format!("处理第 {}/{} 行", row_index, effective_rows));

        let ctx = RowCtx::new(row_index, effective_rows);

        match flow.run(executor, &ctx).await {
            Ok(record) => {
                // 每行立即推给导出环节，崩溃时已处理的记录不丢
                if let Err(e) = exporter.append(&record) {
                    error!("[行 {}] ❌ 导出失败: {}", row_index, e);
                    outcome.record_failure();
                } else {
                    outcome.record_success();
                }
            }
            Err(e) => {
                error!("[行 {}] ❌ 处理失败: {}", row_index, e);
                outcome.record_failure();
            }
        }
    }

    // 平台环境下上传导出产物（键里带运行日期）
    if let Some(uploader) = Uploader::from_config(config) {
        let file_name = std::path::Path::new(&config.export_file)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| config.export_file.clone());
        let key = format!(
            "exports/{}/{}",
            chrono::Local::now().format("%Y-%m-%d"),
            file_name
        );
        match uploader
            .upload_file(&key, exporter.path(), "text/plain")
            .await
        {
            Ok(url) => info!("✓ 导出文件已上传: {}", url),
            Err(e) => warn!("⚠️ 导出文件上传失败: {}", e),
        }
    }

    logging::print_final_stats(&outcome, &config.output_log_file);

    Ok(format!("处理完成: {}", outcome))
}

/// 确定检索范围：任务文件 → 配置默认，再按断点调整起始日期
async fn resolve_search_range(config: &Config) -> SearchRange {
    let mut range = match load_job_file(&config.job_file).await {
        Ok(Some(range)) => range,
        Ok(None) => SearchRange::new(&config.start_date, &config.end_date),
        Err(e) => {
            warn!("⚠️ 任务文件加载失败: {}，使用配置默认范围", e);
            SearchRange::new(&config.start_date, &config.end_date)
        }
    };

    // 断点调整：有断点则从次日继续；读取失败已在内部降级
    range.start_date =
        checkpoint::effective_start_date(&config.checkpoint_file, &range.start_date).await;

    range
}

/// 应用行数上限策略：0 表示处理全部结果行
fn effective_row_count(config: &Config, total_rows: usize) -> usize {
    if config.max_rows > 0 && config.max_rows < total_rows {
        warn!(
            "⚠️ 行数上限生效: 只处理前 {}/{} 行",
            config.max_rows, total_rows
        );
        config.max_rows
    } else {
        total_rows
    }
}
