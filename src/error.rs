//! 错误类型定义
//!
//! 终止型错误（`AppError`）会中断流程并映射为 HTTP 状态码；
//! `SolveError` / `SubmitError` 由协作者以值的形式返回，流程层将其降级处理。

use std::time::Duration;

use async_openai::error::OpenAIError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// secret 不匹配
    #[error("Invalid secret")]
    Unauthorized,
    /// 请求体缺失或格式错误
    #[error("{0}")]
    Validation(String),
    /// 页面中找不到题目
    #[error("No task found")]
    NoTaskFound,
    /// 页面获取失败
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// 同一来源请求过于频繁
    #[error("Rate limit exceeded")]
    RateLimited,
    /// 超出总时长预算
    #[error("Timeout")]
    Timeout,
    /// 调用方已放弃等待
    #[error("Cancelled")]
    Cancelled,
    /// 其他内部错误（例如工作任务 panic）
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn json_required() -> Self {
        AppError::Validation("JSON required".to_string())
    }

    pub fn missing_fields() -> Self {
        AppError::Validation("Missing fields".to_string())
    }

    /// 对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::FORBIDDEN,
            AppError::Validation(_) | AppError::NoTaskFound => StatusCode::BAD_REQUEST,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Fetch(_) | AppError::Timeout | AppError::Cancelled | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status_code(), body).into_response()
    }
}

/// 页面获取错误
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP 请求失败
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// 浏览器启动失败
    #[error("browser launch failed: {0}")]
    Launch(String),
    /// 浏览器操作失败
    #[error("browser error on {url}: {source}")]
    Browser {
        url: String,
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// 等待标记元素超时
    #[error("#{marker} did not appear on {url} within {waited:?}")]
    MarkerTimeout {
        url: String,
        marker: &'static str,
        waited: Duration,
    },
    #[error("fetch cancelled")]
    Cancelled,
}

impl FetchError {
    pub fn browser(url: impl Into<String>, source: chromiumoxide::error::CdpError) -> Self {
        FetchError::Browser {
            url: url.into(),
            source,
        }
    }
}

/// 解题错误，流程层会将其转换为哨兵答案
#[derive(Debug, Error)]
pub enum SolveError {
    #[error("OPENAI_API_KEY is not configured")]
    MissingApiKey,
    /// 构建请求失败
    #[error("failed to build completion request: {0}")]
    Request(#[source] OpenAIError),
    /// API 调用失败
    #[error("completion call to {model} failed: {source}")]
    Api {
        model: String,
        #[source]
        source: OpenAIError,
    },
    /// 返回内容为空
    #[error("{model} returned an empty answer")]
    EmptyContent { model: String },
    #[error("solve cancelled")]
    Cancelled,
}

impl From<OpenAIError> for SolveError {
    fn from(err: OpenAIError) -> Self {
        SolveError::Request(err)
    }
}

/// 提交错误，流程层会将其视为"未答对"
#[derive(Debug, Error)]
pub enum SubmitError {
    /// 本地拒绝超大载荷，不发起网络请求
    #[error("Payload too large: {size} bytes exceeds {limit}")]
    PayloadTooLarge { size: usize, limit: usize },
    #[error("failed to serialize submission: {0}")]
    Serialize(#[from] serde_json::Error),
    /// 网络请求失败
    #[error("submit to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 非 200 响应
    #[error("{endpoint} answered HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// 响应不是合法 JSON
    #[error("{endpoint} answered with an unreadable body: {source}")]
    InvalidBody {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("submit cancelled")]
    Cancelled,
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::missing_fields().status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NoTaskFound.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::RateLimited.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(AppError::Timeout.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let fetch = AppError::from(FetchError::Launch("no chrome".into()));
        assert_eq!(fetch.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn messages_are_client_facing() {
        assert_eq!(AppError::json_required().to_string(), "JSON required");
        assert_eq!(AppError::missing_fields().to_string(), "Missing fields");
        assert_eq!(AppError::Timeout.to_string(), "Timeout");
        assert_eq!(
            AppError::from(FetchError::Launch("no chrome".into())).to_string(),
            "browser launch failed: no chrome"
        );
    }
}
