//! DOM 查询工具 - 业务能力层（叶子）
//!
//! 针对门户这种无稳定标识、动画频繁的 SPA 的通用查询原语：
//! 等待瞬态遮罩消失、健壮点击、从带标签的区块中结构化取文本。
//! 全部实现在 JsExecutor 的 eval 原语之上，不依赖具体 UI 工具包。

use anyhow::Result;
use tokio::time::{sleep, Duration, Instant};
use tracing::debug;

use crate::error::ScrapeError;
use crate::infrastructure::JsExecutor;

/// 结果列表容器
pub const SEL_RESULT_LIST: &str = ".result-list";
/// 单个结果行
pub const SEL_RESULT_ROWS: &str = ".result-list .search-result-row";
/// 加载遮罩（检索和翻页期间短暂出现，会拦截指针事件）
pub const SEL_LOADING_OVERLAY: &str = ".loading-overlay";

/// 轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// 把 Rust 字符串安全地嵌入 JS 源码（带引号的 JSON 字面量）
fn js_quote(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// 可见性探测的 JS 片段
fn visibility_js(selector: &str) -> String {
    format!(
        r#"
        (() => {{
            const el = document.querySelector({sel});
            if (!el) return false;
            const style = window.getComputedStyle(el);
            if (style.display === 'none' || style.visibility === 'hidden') return false;
            const rect = el.getBoundingClientRect();
            return rect.width > 0 && rect.height > 0;
        }})()
        "#,
        sel = js_quote(selector)
    )
}

/// 探测元素当前是否可见（失败视为不可见）
pub async fn is_visible(executor: &JsExecutor, selector: &str) -> bool {
    executor.eval_as_or(visibility_js(selector), false).await
}

/// 有界等待元素可见
pub async fn wait_for_visible(
    executor: &JsExecutor,
    selector: &str,
    timeout: Duration,
) -> Result<()> {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if is_visible(executor, selector).await {
            return Ok(());
        }
        sleep(POLL_INTERVAL).await;
    }
    anyhow::bail!("等待元素可见超时: {}", selector)
}

/// 有界等待元素隐藏
///
/// 元素不存在同样视为隐藏
pub async fn wait_for_hidden(
    executor: &JsExecutor,
    selector: &str,
    timeout: Duration,
) -> Result<()> {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if !is_visible(executor, selector).await {
            return Ok(());
        }
        sleep(POLL_INTERVAL).await;
    }
    anyhow::bail!("等待元素隐藏超时: {}", selector)
}

/// 等待加载遮罩消失
///
/// 遮罩从未出现过也算消失
pub async fn wait_for_overlay_clear(executor: &JsExecutor, timeout: Duration) -> Result<()> {
    wait_for_hidden(executor, SEL_LOADING_OVERLAY, timeout).await
}

/// 健壮点击
///
/// 先尝试交互式点击；被遮罩/动画拦截时回退到 DOM 层 el.click()。
/// 回退是必需的：门户在过渡动画期间经常拦截指针事件
pub async fn robust_click(executor: &JsExecutor, selector: &str) -> Result<()> {
    if let Ok(element) = executor.page().find_element(selector).await {
        if element.click().await.is_ok() {
            return Ok(());
        }
        debug!("交互式点击被拦截，回退到 DOM 层点击: {}", selector);
    }

    let js_code = format!(
        r#"
        (() => {{
            const el = document.querySelector({sel});
            if (!el) return false;
            el.click();
            return true;
        }})()
        "#,
        sel = js_quote(selector)
    );

    let clicked: bool = executor.eval_as(js_code).await?;
    if !clicked {
        return Err(ScrapeError::control_not_interactable(selector).into());
    }
    Ok(())
}

/// 读取元素的文本内容（修剪后；元素缺失返回空串）
pub async fn element_text(executor: &JsExecutor, selector: &str) -> Result<String> {
    let js_code = format!(
        r#"
        (() => {{
            const el = document.querySelector({sel});
            return el ? el.textContent : '';
        }})()
        "#,
        sel = js_quote(selector)
    );

    let raw: String = executor.eval_as(js_code).await?;
    Ok(raw.trim().to_string())
}

/// 统计匹配选择器的元素数量
pub async fn element_count(executor: &JsExecutor, selector: &str) -> Result<usize> {
    let js_code = format!(
        "document.querySelectorAll({sel}).length",
        sel = js_quote(selector)
    );
    let count: usize = executor.eval_as(js_code).await?;
    Ok(count)
}

/// 在命名区块中按标签前缀取标量字段
///
/// 按区块头文本精确匹配定位区块，再找文本以给定键开头的标签，
/// 返回该标签下一个兄弟元素的修剪文本；区块或标签缺失返回空串
pub async fn find_section_value(
    executor: &JsExecutor,
    scope: &str,
    section_header: &str,
    label_prefix: &str,
) -> Result<String> {
    let js_code = format!(
        r#"
        (() => {{
            const root = document.querySelector({scope});
            if (!root) return '';
            const sections = Array.from(root.querySelectorAll('.detail-section'));
            const section = sections.find(s => {{
                const h = s.querySelector('.section-header');
                return h && h.textContent.trim() === {header};
            }});
            if (!section) return '';
            const labels = Array.from(section.querySelectorAll('.field-label'));
            const label = labels.find(l => l.textContent.trim().startsWith({prefix}));
            if (!label || !label.nextElementSibling) return '';
            return label.nextElementSibling.textContent;
        }})()
        "#,
        scope = js_quote(scope),
        header = js_quote(section_header),
        prefix = js_quote(label_prefix)
    );

    let raw: String = executor.eval_as(js_code).await?;
    Ok(raw.trim().to_string())
}

/// 收集命名区块内全部子内容节点的文本（无子区块过滤）
pub async fn collect_section_items(
    executor: &JsExecutor,
    scope: &str,
    section_header: &str,
) -> Result<Vec<String>> {
    let js_code = format!(
        r#"
        (() => {{
            const root = document.querySelector({scope});
            if (!root) return [];
            const sections = Array.from(root.querySelectorAll('.detail-section'));
            const section = sections.find(s => {{
                const h = s.querySelector('.section-header');
                return h && h.textContent.trim() === {header};
            }});
            if (!section) return [];
            return Array.from(section.querySelectorAll('.sub-content')).map(e => e.textContent);
        }})()
        "#,
        scope = js_quote(scope),
        header = js_quote(section_header)
    );

    let raw: Vec<String> = executor.eval_as(js_code).await?;
    Ok(clean_items(raw))
}

/// 收集子区块标记之后的子内容条目
///
/// 严格取标记与下一个标记（或区块结尾）之间的条目，保持 DOM 顺序
pub async fn collect_sublist_after_marker(
    executor: &JsExecutor,
    scope: &str,
    section_header: &str,
    marker: &str,
) -> Result<Vec<String>> {
    let js_code = format!(
        r#"
        (() => {{
            const root = document.querySelector({scope});
            if (!root) return [];
            const sections = Array.from(root.querySelectorAll('.detail-section'));
            const section = sections.find(s => {{
                const h = s.querySelector('.section-header');
                return h && h.textContent.trim() === {header};
            }});
            if (!section) return [];
            const children = Array.from(
                section.querySelectorAll('.sub-section-header, .sub-content'));
            const start = children.findIndex(e =>
                e.classList.contains('sub-section-header')
                && e.textContent.trim() === {marker});
            if (start < 0) return [];
            const out = [];
            for (let i = start + 1; i < children.length; i++) {{
                const e = children[i];
                if (e.classList.contains('sub-section-header')) break;
                out.push(e.textContent);
            }}
            return out;
        }})()
        "#,
        scope = js_quote(scope),
        header = js_quote(section_header),
        marker = js_quote(marker)
    );

    let raw: Vec<String> = executor.eval_as(js_code).await?;
    Ok(clean_items(raw))
}

/// 修剪列表条目并丢弃修剪后为空的项
///
/// 不变量：列表字段不含空白条目
pub fn clean_items(raw: Vec<String>) -> Vec<String> {
    raw.into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// 发送取消键（Escape）
///
/// 用作对话框的防御性关闭手段
pub async fn send_escape(executor: &JsExecutor) -> Result<()> {
    let body = executor.page().find_element("body").await?;
    body.press_key("Escape").await?;
    Ok(())
}
