//! 测试替身：可编排的获取器、解题器、提交器

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{FetchError, SolveError, SubmitError};
use crate::models::{ExtractedTask, SubmissionResult, SubmitPayload};
use crate::services::{AnswerSubmitter, FetchMode, PageFetcher, TaskExtractor, TaskSolver};
use crate::workflow::quiz_flow::{FlowSettings, QuizFlow};

pub const SECRET: &str = "MYTDSLLM2025";

pub fn demo_page(text: &str) -> String {
    format!(
        r#"<html><body><div id="result">{}</div></body></html>"#,
        text
    )
}

pub fn flow_with(
    fetcher: &MockFetcher,
    solver: &MockSolver,
    submitter: &MockSubmitter,
) -> QuizFlow {
    flow_with_fetcher(Arc::new(fetcher.clone()), solver, submitter)
}

pub fn flow_with_fetcher(
    fetcher: Arc<dyn PageFetcher>,
    solver: &MockSolver,
    submitter: &MockSubmitter,
) -> QuizFlow {
    let config = Config::default();
    QuizFlow::new(
        FlowSettings::from_config(&config),
        TaskExtractor::new(config.default_submit_url.clone()),
        fetcher,
        Arc::new(solver.clone()),
        Arc::new(submitter.clone()),
    )
}

#[derive(Clone, Default)]
pub struct MockFetcher {
    pages: HashMap<String, String>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<(String, FetchMode)>>>,
}

impl MockFetcher {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_page(url: &str, html: String) -> Self {
        Self::default().and_page(url, html)
    }

    pub fn and_page(mut self, url: &str, html: String) -> Self {
        self.pages.insert(url.to_string(), html);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(url, _)| url.clone()).collect()
    }

    pub fn modes(&self) -> Vec<FetchMode> {
        self.calls.lock().iter().map(|(_, mode)| *mode).collect()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(
        &self,
        url: &str,
        mode: FetchMode,
        _cancel: &CancellationToken,
    ) -> Result<String, FetchError> {
        self.calls.lock().push((url.to_string(), mode));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Launch(format!("no page for {}", url)))
    }
}

/// 一直挂起直到被取消的获取器
#[derive(Clone, Default)]
pub struct StallingFetcher {
    observed_cancel: Arc<AtomicBool>,
}

impl StallingFetcher {
    pub fn observed_cancel(&self) -> bool {
        self.observed_cancel.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for StallingFetcher {
    async fn fetch(
        &self,
        _url: &str,
        _mode: FetchMode,
        cancel: &CancellationToken,
    ) -> Result<String, FetchError> {
        cancel.cancelled().await;
        self.observed_cancel.store(true, Ordering::SeqCst);
        Err(FetchError::Cancelled)
    }
}

#[derive(Clone)]
pub struct MockSolver {
    answer: Option<Value>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<bool>>>,
}

impl MockSolver {
    pub fn answering(answer: Value) -> Self {
        Self {
            answer: Some(answer),
            delay: None,
            calls: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            delay: None,
            calls: Arc::default(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn demo_flags(&self) -> Vec<bool> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl TaskSolver for MockSolver {
    async fn solve(
        &self,
        _task: &ExtractedTask,
        is_demo: bool,
        _cancel: &CancellationToken,
    ) -> Result<Value, SolveError> {
        self.calls.lock().push(is_demo);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.answer.clone().ok_or(SolveError::MissingApiKey)
    }
}

/// 按脚本依次返回结果，脚本用完后一律判对
#[derive(Clone, Default)]
pub struct MockSubmitter {
    script: Arc<Mutex<VecDeque<Result<SubmissionResult, SubmitError>>>>,
    payloads: Arc<Mutex<Vec<SubmitPayload>>>,
}

impl MockSubmitter {
    pub fn always_correct() -> Self {
        Self::default()
    }

    pub fn scripted(results: Vec<Result<SubmissionResult, SubmitError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(results.into())),
            payloads: Arc::default(),
        }
    }

    pub fn payloads(&self) -> Vec<SubmitPayload> {
        self.payloads.lock().clone()
    }
}

#[async_trait]
impl AnswerSubmitter for MockSubmitter {
    async fn submit(
        &self,
        _endpoint: &str,
        payload: &SubmitPayload,
        _cancel: &CancellationToken,
    ) -> Result<SubmissionResult, SubmitError> {
        self.payloads.lock().push(payload.clone());
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(SubmissionResult::from_json(serde_json::json!({"correct": true}))))
    }
}
