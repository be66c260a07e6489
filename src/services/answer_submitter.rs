//! 答案提交服务 - 业务能力层
//!
//! 只负责"把答案 POST 给评分端点"能力，不关心重试与链式跳转

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::SubmitError;
use crate::models::{SubmissionResult, SubmitPayload};

#[async_trait]
pub trait AnswerSubmitter: Send + Sync {
    async fn submit(
        &self,
        endpoint: &str,
        payload: &SubmitPayload,
        cancel: &CancellationToken,
    ) -> Result<SubmissionResult, SubmitError>;
}

/// HTTP 提交器
pub struct HttpAnswerSubmitter {
    client: reqwest::Client,
    max_payload_bytes: usize,
}

impl HttpAnswerSubmitter {
    pub fn new(timeout: Duration, max_payload_bytes: usize) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            max_payload_bytes,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(config.submit_timeout(), config.max_payload_bytes)
    }

    /// 序列化载荷，超过上限时在本地拒绝
    pub fn encode(&self, payload: &SubmitPayload) -> Result<Vec<u8>, SubmitError> {
        let body = serde_json::to_vec(payload)?;
        if body.len() > self.max_payload_bytes {
            return Err(SubmitError::PayloadTooLarge {
                size: body.len(),
                limit: self.max_payload_bytes,
            });
        }
        Ok(body)
    }

    async fn post(&self, endpoint: &str, body: Vec<u8>) -> Result<SubmissionResult, SubmitError> {
        let response = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|source| SubmitError::Request {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        info!("📤 提交响应: {}", status);

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(SubmitError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|source| SubmitError::InvalidBody {
                endpoint: endpoint.to_string(),
                source,
            })?;
        debug!("提交结果: {}", raw);
        Ok(SubmissionResult::from_json(raw))
    }
}

#[async_trait]
impl AnswerSubmitter for HttpAnswerSubmitter {
    async fn submit(
        &self,
        endpoint: &str,
        payload: &SubmitPayload,
        cancel: &CancellationToken,
    ) -> Result<SubmissionResult, SubmitError> {
        let body = self.encode(payload)?;
        debug!("提交载荷 {} 字节 -> {}", body.len(), endpoint);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SubmitError::Cancelled),
            result = self.post(endpoint, body) => result,
        }
    }
}
