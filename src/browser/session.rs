//! 会话生命周期管理
//!
//! 拥有浏览器进程、一个隔离上下文和唯一的活动页面。
//! 首选系统 Chrome 渠道；启动失败时回退到默认引擎——这是启动阶段
//! 唯一的一次重试，再失败即致命并终止运行。

use std::path::Path;

use anyhow::Result;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::error::{InitError, ScrapeError};

/// 首选浏览器渠道的可执行文件路径
const PREFERRED_CHROME: &str = "/usr/bin/google-chrome";

/// 启动稳定性参数
///
/// 目标站点的证书链不完整，必须容忍无效证书；其余参数保证在受限的
/// 服务器环境中执行行为确定（禁用 GPU、沙盒和后台节流）
const STABILITY_ARGS: [&str; 5] = [
    "--ignore-certificate-errors",
    "--disable-gpu",
    "--no-sandbox",
    "--disable-dev-shm-usage",
    "--disable-background-timer-throttling",
];

/// 浏览器会话
///
/// 职责：
/// - 持有浏览器进程和唯一的页面
/// - 由编排层独占拥有，显式传递给各组件
/// - stop() 按 页面 → 浏览器 → 事件任务 的顺序释放
pub struct Session {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl Session {
    /// 启动浏览器会话
    ///
    /// 先尝试首选渠道，失败后回退到默认引擎；两者都失败则致命
    pub async fn start(headless: bool) -> Result<Self> {
        info!("🚀 启动浏览器会话...");

        let (browser, mut handler) = match Self::launch(headless, Some(PREFERRED_CHROME)).await {
            Ok(pair) => pair,
            Err(e) => {
                warn!("首选浏览器渠道启动失败: {}，回退到默认引擎", e);
                Self::launch(headless, None)
                    .await
                    .map_err(|e| ScrapeError::launch_failed(std::io::Error::other(e.to_string())))?
            }
        };
        debug!("浏览器启动成功");

        // 在后台处理浏览器事件
        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        // 添加短暂延迟以等待浏览器状态同步
        sleep(Duration::from_millis(300)).await;

        let page = browser.new_page("about:blank").await.map_err(|e| {
            ScrapeError::Init(InitError::PageCreationFailed {
                source: Box::new(e),
            })
        })?;

        info!("✅ 浏览器会话就绪");

        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }

    /// 以给定可执行文件启动一次
    async fn launch(
        headless: bool,
        executable: Option<&str>,
    ) -> Result<(Browser, chromiumoxide::Handler)> {
        let mut builder = BrowserConfig::builder();

        if headless {
            builder = builder.new_headless_mode();
        } else {
            builder = builder.with_head();
        }

        if let Some(exe) = executable {
            builder = builder.chrome_executable(Path::new(exe));
        }

        let config = builder.args(STABILITY_ARGS.to_vec()).build().map_err(|e| {
            ScrapeError::Init(InitError::ConfigurationFailed { message: e })
        })?;

        let pair = Browser::launch(config).await?;
        Ok(pair)
    }

    /// 获取活动页面
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 停止会话
    ///
    /// 按 页面 → 浏览器 → 事件任务 的顺序释放；
    /// 收尾阶段的次级错误全部吞掉，绝不遮蔽主运行结果
    pub async fn stop(mut self) {
        debug!("正在停止浏览器会话");

        if let Err(e) = self.page.close().await {
            warn!("关闭页面失败: {}，继续收尾", e);
        }

        if let Err(e) = self.browser.close().await {
            warn!("关闭浏览器失败: {}，继续收尾", e);
        }

        self.handler_task.abort();
        info!("✓ 浏览器会话已停止");
    }
}
