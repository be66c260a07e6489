//! Quiz 处理流程 - 流程层
//!
//! 核心职责：定义"一次请求"的完整处理流程
//!
//! 流程顺序（每一跳）：
//! 1. 获取页面 → 提取题目
//! 2. 解题 → 提交
//! 3. 答错且时间充足 → 重试一次
//! 4. 答对且有下一题且时间充足 → 进入下一跳，否则结束

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, FetchError, SolveError, SubmitError};
use crate::models::{ExtractedTask, QuizRequest, SubmissionResult, SubmitPayload};
use crate::services::{AnswerSubmitter, FetchMode, PageFetcher, TaskExtractor, TaskSolver};
use crate::utils::logging::format_elapsed;
use crate::workflow::budget::TimeBudget;
use crate::workflow::quiz_ctx::QuizCtx;

/// 解题失败时提交的哨兵答案
pub const SOLVE_ERROR_ANSWER: &str = "Error solving";

/// 答错时附带的提示
pub const MAY_BE_INCORRECT: &str = "May be incorrect";

/// 流程参数
#[derive(Debug, Clone)]
pub struct FlowSettings {
    pub secret: String,
    pub ceiling: Duration,
    pub retry_margin: Duration,
    pub chain_margin: Duration,
}

impl FlowSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            secret: config.my_secret.clone(),
            ceiling: config.max_time(),
            retry_margin: config.retry_margin(),
            chain_margin: config.chain_margin(),
        }
    }
}

/// 正常结束的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizCompletion {
    /// 实际处理的跳数
    pub hops: usize,
    /// 最后一次提交是否被判对
    pub correct: bool,
}

impl QuizCompletion {
    pub fn to_json(&self) -> Value {
        if self.correct {
            json!({ "status": "finished" })
        } else {
            json!({ "status": "finished", "note": MAY_BE_INCORRECT })
        }
    }
}

/// Quiz 处理流程
///
/// - 编排 获取 → 提取 → 解题 → 提交 → 重试/跳转
/// - 所有时间判断集中在 [`TimeBudget`]
/// - 只依赖业务能力（services），协作者通过 trait 注入
pub struct QuizFlow {
    fetcher: Arc<dyn PageFetcher>,
    extractor: TaskExtractor,
    solver: Arc<dyn TaskSolver>,
    submitter: Arc<dyn AnswerSubmitter>,
    settings: FlowSettings,
}

impl QuizFlow {
    pub fn new(
        settings: FlowSettings,
        extractor: TaskExtractor,
        fetcher: Arc<dyn PageFetcher>,
        solver: Arc<dyn TaskSolver>,
        submitter: Arc<dyn AnswerSubmitter>,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            solver,
            submitter,
            settings,
        }
    }

    /// 运行完整流程
    ///
    /// secret 不匹配时不发起任何网络请求
    pub async fn run(
        &self,
        request: QuizRequest,
        cancel: CancellationToken,
    ) -> AppResult<QuizCompletion> {
        if request.secret != self.settings.secret {
            warn!("🔒 secret 不匹配，拒绝请求 ({})", request.email);
            return Err(AppError::Unauthorized);
        }

        let budget = TimeBudget::start(self.settings.ceiling);
        info!("▶️ 开始处理 {} -> {}", request.email, request.url);

        let outcome = self.run_hops(&request, &budget, &cancel).await;
        let elapsed = format_elapsed(budget.elapsed());
        match &outcome {
            Ok(done) if done.correct => {
                info!("🏁 完成: {} 跳, 耗时 {}", done.hops, elapsed)
            }
            Ok(done) => warn!(
                "🏁 完成但答案可能错误: {} 跳, 耗时 {}",
                done.hops, elapsed
            ),
            Err(e) => error!("❌ 流程失败: {}, 耗时 {}", e, elapsed),
        }
        outcome
    }

    async fn run_hops(
        &self,
        request: &QuizRequest,
        budget: &TimeBudget,
        cancel: &CancellationToken,
    ) -> AppResult<QuizCompletion> {
        let mut ctx = QuizCtx::first(request.url.clone());

        loop {
            self.ensure_budget(budget, cancel)?;

            info!("{} 📥 获取页面...", ctx);
            let html = self
                .fetcher
                .fetch(&ctx.url, FetchMode::for_url(&ctx.url), cancel)
                .await
                .map_err(|e| match e {
                    FetchError::Cancelled => AppError::Cancelled,
                    other => AppError::Fetch(other),
                })?;

            let task = self.extractor.extract(&html, &ctx.url).ok_or_else(|| {
                warn!("{} ⚠️ 页面中没有题目", ctx);
                AppError::NoTaskFound
            })?;

            self.ensure_budget(budget, cancel)?;
            let mut result = self.attempt(&ctx, request, &task, budget, cancel).await?;

            if !result.correct && budget.allows(self.settings.retry_margin) {
                info!("{} 🔁 答案未通过，重试一次...", ctx);
                result = self.attempt(&ctx, request, &task, budget, cancel).await?;
            }

            if !result.correct {
                return Ok(QuizCompletion {
                    hops: ctx.hop,
                    correct: false,
                });
            }

            match result.next_url {
                Some(next) if budget.allows(self.settings.chain_margin) => {
                    info!("{} ➡️ 答对，进入下一题: {}", ctx, next);
                    ctx = ctx.next(next);
                }
                Some(next) => {
                    warn!(
                        "{} ⏱️ 剩余时间 {} 不足，放弃下一题 {}",
                        ctx,
                        format_elapsed(budget.remaining()),
                        next
                    );
                    return Ok(QuizCompletion {
                        hops: ctx.hop,
                        correct: true,
                    });
                }
                None => {
                    return Ok(QuizCompletion {
                        hops: ctx.hop,
                        correct: true,
                    })
                }
            }
        }
    }

    /// 解题并提交一次
    ///
    /// 解题失败提交哨兵答案，提交失败视为答错；只有取消会中断流程
    async fn attempt(
        &self,
        ctx: &QuizCtx,
        request: &QuizRequest,
        task: &ExtractedTask,
        budget: &TimeBudget,
        cancel: &CancellationToken,
    ) -> AppResult<SubmissionResult> {
        let answer = match self.solver.solve(task, ctx.is_demo, cancel).await {
            Ok(answer) => answer,
            Err(SolveError::Cancelled) => return Err(AppError::Cancelled),
            Err(e) => {
                warn!(
                    "{} ⚠️ 解题失败，提交哨兵答案: {}, 已耗时 {}",
                    ctx,
                    e,
                    format_elapsed(budget.elapsed())
                );
                Value::String(SOLVE_ERROR_ANSWER.to_string())
            }
        };

        let payload = SubmitPayload {
            email: request.email.clone(),
            secret: request.secret.clone(),
            url: ctx.url.clone(),
            answer,
        };

        match self.submitter.submit(&task.submit_url, &payload, cancel).await {
            Ok(result) => {
                info!("{} 📬 评分: correct = {} | {}", ctx, result.correct, result.raw);
                Ok(result)
            }
            Err(SubmitError::Cancelled) => Err(AppError::Cancelled),
            Err(e) => {
                warn!(
                    "{} ⚠️ 提交失败，按答错处理: {}, 已耗时 {}",
                    ctx,
                    e,
                    format_elapsed(budget.elapsed())
                );
                Ok(SubmissionResult::rejected(e.to_string()))
            }
        }
    }

    fn ensure_budget(&self, budget: &TimeBudget, cancel: &CancellationToken) -> AppResult<()> {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        if budget.is_exhausted() {
            return Err(AppError::Timeout);
        }
        Ok(())
    }
}
