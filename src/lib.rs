//! # Land Record Scrape
//!
//! 一个从政府土地登记门户（无 API 的 JavaScript SPA）自动抽取
//! 公开登记记录的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//! - `browser/Session` - 浏览器进程和页面的生命周期
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个对象
//! - `dom_query` - 遮罩等待 / 健壮点击 / 区块文本提取原语
//! - `search` - 日期范围检索提交（带重试）
//! - `DocumentCapture` - 打印转 blob 的文档捕获能力
//! - `RecordExporter` - 分隔文本流式导出能力
//! - `checkpoint` - 断点续传读取能力
//! - `StatusWriter` - 进度 / 终止状态输出能力
//! - `Uploader` - 平台环境下的对象存储上传能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个结果行"的完整处理流程
//! - `RowCtx` - 上下文封装（行索引 + 作用域选择器）
//! - `RowFlow` - 状态机编排（展开 → 提取 → 捕获 → 折叠）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/pipeline` - 整次运行的推进：会话 → 检索 →
//!   行循环 → 导出 → 收尾，单行失败不中断批处理

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::Session;
pub use config::Config;
pub use error::{ScrapeError, ScrapeResult};
pub use infrastructure::JsExecutor;
pub use models::record::{RecordEntry, ResumeCheckpoint, RunOutcome, SearchRange};
pub use orchestrator::App;
pub use workflow::{RowCtx, RowFlow};
