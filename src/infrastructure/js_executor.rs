//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"在门户页面里执行 JS"的能力

use anyhow::Result;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力
/// - 不认识行 / 记录 / 检索
/// - 不处理业务流程
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于元素级点击、按键等非 eval 操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 执行 JS 代码，失败或类型不符时返回默认值
    ///
    /// 用于"探测"性质的查询（可见性、计数），这类查询的失败不应打断流程
    pub async fn eval_as_or<T: DeserializeOwned>(
        &self,
        js_code: impl Into<String>,
        default: T,
    ) -> T {
        match self.eval_as(js_code).await {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("探测查询失败，使用默认值: {}", e);
                default
            }
        }
    }
}
