//! Quiz 相关的数据结构

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};

/// 触发请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizRequest {
    pub email: String,
    pub secret: String,
    pub url: String,
}

impl QuizRequest {
    pub fn new(
        email: impl Into<String>,
        secret: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            secret: secret.into(),
            url: url.into(),
        }
    }

    /// 从 JSON 请求体中读取三个必填字段
    ///
    /// 缺失、非字符串或空字符串都视为缺失
    pub fn from_json(body: &Value) -> AppResult<Self> {
        let field = |name: &str| {
            body.get(name)
                .and_then(Value::as_str)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        match (field("email"), field("secret"), field("url")) {
            (Some(email), Some(secret), Some(url)) => Ok(Self { email, secret, url }),
            _ => Err(AppError::missing_fields()),
        }
    }
}

/// URL 中包含 "demo"（不区分大小写）即为演示题
pub fn is_demo_url(url: &str) -> bool {
    url.to_lowercase().contains("demo")
}

/// 从页面中提取出的题目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTask {
    /// 题目文本，非空
    pub task_text: String,
    /// 答案提交地址
    pub submit_url: String,
    /// 第一个 .pdf 链接
    pub document_url: Option<String>,
}

/// 提交给评分端点的载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitPayload {
    pub email: String,
    pub secret: String,
    /// 当前题目的页面地址
    pub url: String,
    pub answer: Value,
}

/// 评分结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionResult {
    /// 缺失或非布尔值均视为 false
    pub correct: bool,
    /// 下一题地址，空字符串视为缺失
    pub next_url: Option<String>,
    /// 原始响应，用于日志
    pub raw: Value,
}

impl SubmissionResult {
    pub fn from_json(raw: Value) -> Self {
        let correct = raw.get("correct").and_then(Value::as_bool).unwrap_or(false);
        let next_url = raw
            .get("url")
            .and_then(Value::as_str)
            .filter(|u| !u.trim().is_empty())
            .map(str::to_string);
        Self {
            correct,
            next_url,
            raw,
        }
    }

    /// 提交失败时的降级结果
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            correct: false,
            next_url: None,
            raw: serde_json::json!({ "error": message.into() }),
        }
    }
}
