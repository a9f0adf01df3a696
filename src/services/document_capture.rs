//! 文档捕获子系统 - 业务能力层
//!
//! 驱动门户的打印流程，绕过原生打印对话框，以"打印转 blob"
//! 侧信道取得底层文档的二进制数据。
//!
//! 门户的打印功能会打开一个嵌套 frame，并在其中独立调起原生打印
//! 对话框；宿主和 frame 两级不同时压制的话，自动化线程会被无限
//! 阻塞。因此触发打印之前必须先安装两处执行期拦截：
//! 1. 废掉页面全局的打印入口
//! 2. 包装 DOM 节点插入原语，让此后出现的任何 iframe 在加载完成时
//!    立即废掉自己的打印入口
//!
//! 对外承诺：capture() 绝不向外抛错——缺失的附件不能拖垮所在行，
//! 一切失败都退化为空结果加一条日志。

use anyhow::Result;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use regex::Regex;
use std::path::PathBuf;
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{CaptureError, ScrapeError};
use crate::infrastructure::JsExecutor;
use crate::services::dom_query;
use crate::services::uploader::Uploader;

/// 行详情里的文档打开控件
const SEL_DOCUMENT_LINK: &str = ".row-detail .document-open-link";
/// 文档查看器画布
const SEL_VIEWER_CANVAS: &str = ".document-viewer canvas";
/// 查看器工具栏的打印按钮
const SEL_VIEWER_PRINT: &str = ".viewer-toolbar .print-button";
/// 打印选项对话框
const SEL_PRINT_DIALOG: &str = ".print-options-dialog";
/// 对话框确认按钮
const SEL_DIALOG_CONFIRM: &str = ".print-options-dialog .confirm-button";
/// 承载渲染后打印目标的 iframe
const SEL_PRINT_FRAME: &str = "iframe.print-frame";
/// 查看器返回按钮
const SEL_BACK_BUTTON: &str = ".viewer-back-button";
/// "整份文档"打印范围的标签文本
const LABEL_ENTIRE_DOCUMENT: &str = "Entire Document";

const VIEWER_TIMEOUT: Duration = Duration::from_secs(20);
const DIALOG_TIMEOUT: Duration = Duration::from_secs(10);
/// 打印渲染可能很慢，iframe 挂载的等待上限放宽
const FRAME_TIMEOUT: Duration = Duration::from_secs(45);
const CLEANUP_RESULTS_TIMEOUT: Duration = Duration::from_secs(15);
const CLEANUP_OVERLAY_TIMEOUT: Duration = Duration::from_secs(15);
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// 空白或缺失的标识清洗后使用的占位文件名
const FALLBACK_FILENAME: &str = "document";

/// 文档捕获服务
///
/// 职责：
/// - 只处理单个文档的捕获
/// - 不认识 RecordEntry / 行循环
/// - 失败在内部消化，返回空位置
pub struct DocumentCapture {
    pdf_dir: String,
    uploader: Option<Uploader>,
}

impl DocumentCapture {
    /// 创建文档捕获服务
    pub fn new(config: &Config) -> Self {
        Self {
            pdf_dir: config.pdf_dir.clone(),
            uploader: Uploader::from_config(config),
        }
    }

    /// 捕获一个文档
    ///
    /// # 返回
    /// 本地路径或外部 URL；任何失败返回空字符串（绝不抛错）
    pub async fn capture(&self, executor: &JsExecutor, document_no: &str) -> String {
        info!("📑 开始捕获文档: {}", document_no);

        let location = match self.try_capture(executor, document_no).await {
            Ok(location) => {
                info!("✓ 文档捕获成功: {}", location);
                location
            }
            Err(e) => {
                warn!("⚠️ 文档捕获失败 ({}): {}，该行继续", document_no, e);
                String::new()
            }
        };

        // 清理总是执行，把 UI 恢复到行状态机期望的结果列表状态
        self.cleanup(executor).await;

        location
    }

    /// 捕获主流程（任一步失败即中断，落入 capture() 的统一处理）
    async fn try_capture(&self, executor: &JsExecutor, document_no: &str) -> Result<String> {
        self.open_viewer(executor, document_no).await?;

        dom_query::wait_for_visible(executor, SEL_VIEWER_CANVAS, VIEWER_TIMEOUT)
            .await
            .map_err(|_| ScrapeError::Capture(CaptureError::ViewerTimeout))?;
        debug!("文档查看器已出现");

        // 压制必须安装在触发打印之前
        install_print_interception(executor).await?;

        dom_query::robust_click(executor, SEL_VIEWER_PRINT).await?;

        dom_query::wait_for_visible(executor, SEL_PRINT_DIALOG, DIALOG_TIMEOUT)
            .await
            .map_err(|_| ScrapeError::Capture(CaptureError::DialogTimeout))?;

        select_entire_document(executor).await?;
        confirm_dialog(executor).await?;

        // 额外的防御性关闭；失败无所谓
        let _ = dom_query::send_escape(executor).await;

        let src = wait_for_print_frame(executor, FRAME_TIMEOUT).await?;
        if !src.starts_with("blob:") {
            return Err(ScrapeError::not_blob_source(src).into());
        }
        debug!("打印 iframe 已挂载: {}", src);

        let bytes = fetch_blob_bytes(executor, &src).await?;

        // 立即移除捕获 iframe，残留的 iframe 会被误认为下一条记录的捕获结果
        remove_print_frame(executor).await;

        let local_path = self.persist(document_no, &bytes).await?;

        // 平台环境下额外上传，返回外部引用而非本地路径
        if let Some(uploader) = &self.uploader {
            let key = format!("documents/{}.pdf", sanitize_filename(document_no));
            match uploader.upload_bytes(&key, bytes, "application/pdf").await {
                Ok(url) => return Ok(url),
                Err(e) => {
                    warn!("⚠️ 文档上传失败: {}，保留本地路径", e);
                }
            }
        }

        Ok(local_path)
    }

    /// 点击当前行的文档打开控件
    ///
    /// 必须按可见文档编号精确匹配限定作用域——页面级匹配可能取到
    /// 其他行的文档
    async fn open_viewer(&self, executor: &JsExecutor, document_no: &str) -> Result<()> {
        let js_code = format!(
            r#"
            ((docNo) => {{
                const links = Array.from(document.querySelectorAll({sel}));
                const target = links.find(l => l.textContent.trim() === docNo);
                if (!target) return false;
                target.click();
                return true;
            }})({doc})
            "#,
            sel = serde_json::to_string(SEL_DOCUMENT_LINK)?,
            doc = serde_json::to_string(document_no)?
        );

        let clicked: bool = executor.eval_as(js_code).await?;
        if !clicked {
            return Err(ScrapeError::Capture(CaptureError::OpenControlNotFound {
                document_no: document_no.to_string(),
            })
            .into());
        }
        Ok(())
    }

    /// 写入本地存储，文件名取清洗后的文档标识
    async fn persist(&self, document_no: &str, bytes: &[u8]) -> Result<String> {
        let file_name = format!("{}.pdf", sanitize_filename(document_no));
        let path = PathBuf::from(&self.pdf_dir).join(&file_name);
        let path_text = path.to_string_lossy().to_string();

        tokio::fs::create_dir_all(&self.pdf_dir).await.map_err(|e| {
            ScrapeError::Capture(CaptureError::PersistFailed {
                path: self.pdf_dir.clone(),
                source: Box::new(e),
            })
        })?;

        tokio::fs::write(&path, bytes).await.map_err(|e| {
            ScrapeError::Capture(CaptureError::PersistFailed {
                path: path_text.clone(),
                source: Box::new(e),
            })
        })?;

        debug!("已写入 {} 字节到 {}", bytes.len(), path_text);
        Ok(path_text)
    }

    /// 非抛错清理：无论捕获结果如何都执行
    ///
    /// 吞掉的失败类别固定为：按键失败、返回按钮缺失/点击失败、
    /// 结果列表等待超时、遮罩等待超时；它们不得上浮到捕获之上
    async fn cleanup(&self, executor: &JsExecutor) {
        let _ = dom_query::send_escape(executor).await;

        remove_print_frame(executor).await;

        if dom_query::is_visible(executor, SEL_BACK_BUTTON).await {
            if let Err(e) = dom_query::robust_click(executor, SEL_BACK_BUTTON).await {
                debug!("返回按钮点击失败: {}", e);
            }
        }

        if let Err(e) =
            dom_query::wait_for_visible(executor, dom_query::SEL_RESULT_LIST, CLEANUP_RESULTS_TIMEOUT)
                .await
        {
            debug!("清理阶段等待结果列表失败: {}", e);
        }

        if let Err(e) = dom_query::wait_for_overlay_clear(executor, CLEANUP_OVERLAY_TIMEOUT).await {
            debug!("清理阶段等待遮罩消失失败: {}", e);
        }
    }
}

/// 安装打印拦截（幂等）
///
/// 效果：废掉宿主打印入口，并让此后插入的任何 iframe 在加载时
/// 废掉自己的打印入口
async fn install_print_interception(executor: &JsExecutor) -> Result<()> {
    let js_code = r#"
        (() => {
            if (window.__printInterceptionInstalled) return true;
            window.__printInterceptionInstalled = true;
            window.print = () => {};
            const origAppend = Node.prototype.appendChild;
            Node.prototype.appendChild = function (node) {
                const result = origAppend.call(this, node);
                try {
                    if (node && node.tagName === 'IFRAME') {
                        node.addEventListener('load', () => {
                            try {
                                if (node.contentWindow) node.contentWindow.print = () => {};
                            } catch (e) {}
                        });
                    }
                } catch (e) {}
                return result;
            };
            return true;
        })()
    "#;

    let installed: bool = executor.eval_as(js_code).await?;
    if !installed {
        return Err(ScrapeError::Capture(CaptureError::InterceptionFailed).into());
    }
    debug!("打印拦截已安装");
    Ok(())
}

/// 选择"整份文档"打印范围
///
/// 先按标签文本定位，再取它前面的单选控件；该控件被视觉遮挡，
/// 只能脚本层强制选中
async fn select_entire_document(executor: &JsExecutor) -> Result<()> {
    let js_code = format!(
        r#"
        (() => {{
            const labels = Array.from(document.querySelectorAll({dialog} + ' label'));
            const target = labels.find(l => l.textContent.trim() === {label});
            if (!target) return false;
            const radio = target.previousElementSibling;
            if (!radio || radio.tagName !== 'INPUT') return false;
            radio.checked = true;
            radio.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return true;
        }})()
        "#,
        dialog = serde_json::to_string(SEL_PRINT_DIALOG)?,
        label = serde_json::to_string(LABEL_ENTIRE_DOCUMENT)?
    );

    let selected: bool = executor.eval_as(js_code).await?;
    if !selected {
        return Err(ScrapeError::Capture(CaptureError::DialogControlFailed {
            control: "entire-document radio".to_string(),
        })
        .into());
    }
    Ok(())
}

/// 脚本层触发对话框确认
///
/// 不走 UI 点击——压制不彻底时原生对话框的残余行为仍可能阻塞
async fn confirm_dialog(executor: &JsExecutor) -> Result<()> {
    let js_code = format!(
        r#"
        (() => {{
            const btn = document.querySelector({sel});
            if (!btn) return false;
            btn.click();
            return true;
        }})()
        "#,
        sel = serde_json::to_string(SEL_DIALOG_CONFIRM)?
    );

    let confirmed: bool = executor.eval_as(js_code).await?;
    if !confirmed {
        return Err(ScrapeError::Capture(CaptureError::DialogControlFailed {
            control: "confirm button".to_string(),
        })
        .into());
    }
    Ok(())
}

/// 有界等待打印 iframe 挂载并返回其 src
async fn wait_for_print_frame(executor: &JsExecutor, timeout: Duration) -> Result<String> {
    let probe = format!(
        r#"
        (() => {{
            const f = document.querySelector({sel});
            return f && f.src ? f.src : '';
        }})()
        "#,
        sel = serde_json::to_string(SEL_PRINT_FRAME)?
    );

    let start = Instant::now();
    while start.elapsed() < timeout {
        let src: String = executor.eval_as_or(probe.clone(), String::new()).await;
        if !src.is_empty() {
            return Ok(src);
        }
        sleep(POLL_INTERVAL).await;
    }

    Err(ScrapeError::Capture(CaptureError::FrameTimeout {
        waited_secs: timeout.as_secs(),
    })
    .into())
}

/// 在页面脚本上下文里取 blob 字节
///
/// 字节无法直接跨越自动化边界，以 base64 往返
async fn fetch_blob_bytes(executor: &JsExecutor, blob_src: &str) -> Result<Vec<u8>> {
    let js_code = format!(
        r#"
        (async () => {{
            try {{
                const resp = await fetch({src});
                const buf = await resp.arrayBuffer();
                const bytes = new Uint8Array(buf);
                let binary = '';
                const chunk = 0x8000;
                for (let i = 0; i < bytes.length; i += chunk) {{
                    binary += String.fromCharCode.apply(null, bytes.subarray(i, i + chunk));
                }}
                return {{ ok: true, data: btoa(binary) }};
            }} catch (error) {{
                return {{ ok: false, error: String(error) }};
            }}
        }})()
        "#,
        src = serde_json::to_string(blob_src)?
    );

    let result = executor.eval(js_code).await?;

    let ok = result.get("ok").and_then(|v| v.as_bool()).unwrap_or(false);
    if !ok {
        let message = result
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("未知错误")
            .to_string();
        return Err(ScrapeError::Capture(CaptureError::FetchFailed { message }).into());
    }

    let encoded = result
        .get("data")
        .and_then(|v| v.as_str())
        .unwrap_or_default();

    let bytes = BASE64.decode(encoded).map_err(|e| {
        ScrapeError::Capture(CaptureError::DecodeFailed {
            source: Box::new(e),
        })
    })?;

    debug!("已取回 {} 字节", bytes.len());
    Ok(bytes)
}

/// 移除捕获 iframe（尽力而为）
async fn remove_print_frame(executor: &JsExecutor) {
    let js_code = format!(
        r#"
        (() => {{
            const f = document.querySelector({sel});
            if (f) f.remove();
            return true;
        }})()
        "#,
        sel = serde_json::to_string(SEL_PRINT_FRAME).unwrap_or_else(|_| "''".to_string())
    );
    let _: bool = executor.eval_as_or(js_code, false).await;
}

/// 清洗文档标识为合法文件名
///
/// 非法字符一律替换为下划线；清洗结果为空时使用固定占位名。
/// 幂等：对已清洗的名字再清洗得到同一结果
pub fn sanitize_filename(raw: &str) -> String {
    let cleaned = match Regex::new(r#"[\\/:*?"<>|\x00-\x1F]"#) {
        Ok(re) => re.replace_all(raw, "_").into_owned(),
        // 模式是固定字面量，此分支只为保持函数无失败
        Err(_) => raw.replace(['\\', '/', ':', '*', '?', '"', '<', '>', '|'], "_"),
    };

    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}
