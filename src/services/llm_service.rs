//! LLM 解题服务 - 业务能力层
//!
//! 只负责"给出答案"能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::SolveError;
use crate::models::ExtractedTask;
use crate::services::document_service::DocumentService;

#[async_trait]
pub trait TaskSolver: Send + Sync {
    /// 为题目给出答案
    ///
    /// 演示题直接返回固定答案，不访问网络
    async fn solve(
        &self,
        task: &ExtractedTask,
        is_demo: bool,
        cancel: &CancellationToken,
    ) -> Result<Value, SolveError>;
}

/// LLM 服务
///
/// 职责：
/// - 演示题返回固定答案
/// - 真实题调用一次 chat completion（temperature 0）
/// - 可选地下载 PDF 生成提示
pub struct LlmService {
    /// 未配置 API Key 时为空
    client: Option<Client<OpenAIConfig>>,
    model_name: String,
    max_tokens: u32,
    demo_answer: Value,
    documents: Option<DocumentService>,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config, documents: Option<DocumentService>) -> Self {
        let client = config.llm_api_key.as_ref().map(|key| {
            let openai_config = OpenAIConfig::new()
                .with_api_key(key)
                .with_api_base(&config.llm_api_base_url);
            Client::with_config(openai_config)
        });

        Self {
            client,
            model_name: config.llm_model_name.clone(),
            max_tokens: config.llm_max_tokens,
            demo_answer: Value::from(config.demo_answer),
            documents,
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    ///
    /// # 返回
    /// 去除首尾空白后的响应内容
    pub async fn send_to_llm(&self, user_message: &str) -> Result<String, SolveError> {
        let client = self.client.as_ref().ok_or(SolveError::MissingApiKey)?;
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![ChatCompletionRequestMessage::User(user_msg)])
            .temperature(0.0)
            .max_tokens(self.max_tokens)
            .build()?;

        let response = client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            SolveError::Api {
                model: self.model_name.clone(),
                source: e,
            }
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| SolveError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content)
    }

    async fn document_hint(&self, task: &ExtractedTask, cancel: &CancellationToken) -> Option<String> {
        let documents = self.documents.as_ref()?;
        let url = task.document_url.as_deref()?;
        documents.fetch_hint(url, cancel).await
    }
}

#[async_trait]
impl TaskSolver for LlmService {
    async fn solve(
        &self,
        task: &ExtractedTask,
        is_demo: bool,
        cancel: &CancellationToken,
    ) -> Result<Value, SolveError> {
        if is_demo {
            info!("🎯 演示题，使用固定答案 {}", self.demo_answer);
            return Ok(self.demo_answer.clone());
        }

        if self.client.is_none() {
            return Err(SolveError::MissingApiKey);
        }

        let hint = self.document_hint(task, cancel).await;
        let prompt = build_prompt(task, hint.as_deref());

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SolveError::Cancelled),
            answer = self.send_to_llm(&prompt) => answer.map(Value::String),
        }
    }
}

/// 构建解题提示词
pub fn build_prompt(task: &ExtractedTask, document_hint: Option<&str>) -> String {
    let mut prompt = format!(
        "Solve this task. Output only the final answer. Task: {}",
        task.task_text
    );
    if let Some(url) = &task.document_url {
        prompt.push_str(&format!("\nPDF: {}", url));
    }
    if let Some(hint) = document_hint {
        prompt.push_str(&format!("\nDocument hint: {}", hint));
    }
    prompt
}
