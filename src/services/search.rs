//! 检索提交控制器 - 业务能力层
//!
//! 填入日期范围并提交，失败时有界重试。
//! 结果列表在网络静默之后才异步挂载，所以静默等待之后
//! 还要加固定沉降延迟再等列表出现。

use anyhow::{Context, Result};
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, info};

use crate::error::ScrapeError;
use crate::infrastructure::JsExecutor;
use crate::models::record::SearchRange;
use crate::services::dom_query;
use crate::utils::retry_with_backoff;

/// 起始日期输入框
const SEL_START_DATE: &str = "#beginDate-input";
/// 结束日期输入框
const SEL_END_DATE: &str = "#endDate-input";
/// 提交按钮
///
/// 页面渲染两个外观不同的提交按钮；必须用表单作用域锁定顶部表单
/// 的那个，否则会出现多元素匹配歧义
const SEL_SUBMIT: &str = "#searchForm button.submit-search";

/// 最大提交尝试次数
const MAX_SEARCH_ATTEMPTS: usize = 3;
/// 两次尝试之间的固定退避
const SEARCH_BACKOFF: Duration = Duration::from_secs(5);
/// 日期输入框出现的等待上限
const INPUT_TIMEOUT: Duration = Duration::from_secs(15);
/// 初始 DOM 就绪等待上限
const READY_TIMEOUT: Duration = Duration::from_secs(30);
/// 网络静默后的固定沉降延迟（等客户端重渲染）
const SETTLE_DELAY: Duration = Duration::from_secs(2);
/// 结果列表挂载的等待上限
const RESULTS_TIMEOUT: Duration = Duration::from_secs(20);

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// 提交检索（带重试）
///
/// 最多尝试 3 次，固定退避；全部失败对整个运行是致命的
pub async fn submit_with_retry(
    executor: &JsExecutor,
    portal_url: &str,
    range: &SearchRange,
) -> Result<()> {
    retry_with_backoff(
        MAX_SEARCH_ATTEMPTS,
        SEARCH_BACKOFF,
        "检索提交",
        move |attempt| {
            let executor = executor;
            let portal_url = portal_url;
            let range = range;
            async move { submit_once(executor, portal_url, range, attempt).await }
        },
    )
    .await
    .context(ScrapeError::Search(
        crate::error::SearchError::RetriesExhausted {
            attempts: MAX_SEARCH_ATTEMPTS,
        },
    ))
}

/// 单次提交尝试
async fn submit_once(
    executor: &JsExecutor,
    portal_url: &str,
    range: &SearchRange,
    attempt: usize,
) -> Result<()> {
    info!("🔍 提交检索 (尝试 {}): {}", attempt, range);

    executor
        .page()
        .goto(portal_url)
        .await
        .with_context(|| format!("导航到 {} 失败", portal_url))?;

    wait_for_dom_ready(executor, READY_TIMEOUT).await?;
    debug!("初始 DOM 就绪");

    // 日期输入框不可交互时整次尝试失败
    dom_query::wait_for_visible(executor, SEL_START_DATE, INPUT_TIMEOUT)
        .await
        .map_err(|_| ScrapeError::control_not_interactable(SEL_START_DATE))?;

    fill_date(executor, SEL_START_DATE, &range.start_date).await?;
    fill_date(executor, SEL_END_DATE, &range.end_date).await?;

    dom_query::robust_click(executor, SEL_SUBMIT).await?;
    debug!("已点击提交按钮");

    // 网络静默 + 沉降延迟 + 结果列表挂载
    wait_for_dom_ready(executor, READY_TIMEOUT).await?;
    sleep(SETTLE_DELAY).await;

    dom_query::wait_for_visible(executor, dom_query::SEL_RESULT_LIST, RESULTS_TIMEOUT)
        .await
        .map_err(|_| ScrapeError::quiescence_timeout(RESULTS_TIMEOUT.as_secs()))?;

    info!("✓ 检索提交成功，结果列表已挂载");
    Ok(())
}

/// 覆盖式填入日期字段
///
/// SPA 的数据绑定不监听 value 赋值本身，必须补发 input / change 事件
async fn fill_date(executor: &JsExecutor, selector: &str, value: &str) -> Result<()> {
    let js_code = format!(
        r#"
        (() => {{
            const input = document.querySelector({sel});
            if (!input) return false;
            input.focus();
            input.value = {value};
            input.dispatchEvent(new Event('input', {{ bubbles: true }}));
            input.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return true;
        }})()
        "#,
        sel = serde_json::to_string(selector)?,
        value = serde_json::to_string(value)?
    );

    let filled: bool = executor.eval_as(js_code).await?;
    if !filled {
        return Err(ScrapeError::control_not_interactable(selector).into());
    }
    debug!("已填入 {} = {}", selector, value);
    Ok(())
}

/// 有界等待 document.readyState 达到 complete
async fn wait_for_dom_ready(executor: &JsExecutor, timeout: Duration) -> Result<()> {
    let start = Instant::now();
    while start.elapsed() < timeout {
        let ready: bool = executor
            .eval_as_or("document.readyState === 'complete'", false)
            .await;
        if ready {
            return Ok(());
        }
        sleep(POLL_INTERVAL).await;
    }
    anyhow::bail!("等待页面就绪超时")
}
