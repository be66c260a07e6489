//! # Quiz Relay
//!
//! 接收题目 URL，自动完成"获取页面 → 提取题目 → 解题 → 提交 → 跳转"的 HTTP 服务
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `browser/` - 启动无头浏览器（带反检测参数）
//! - `infrastructure/` - `PageReader` 是唯一的 page owner，等待标记元素并读取 HTML
//!
//! ### ② 业务能力层（Services）
//! - `PageFetcher` - 直接请求或渲染后获取页面
//! - `TaskExtractor` - 从 HTML 中提取题目文本和提交地址
//! - `TaskSolver` - demo 常量答案或 LLM 解题
//! - `AnswerSubmitter` - POST JSON 提交答案
//! - `RateLimiter` - 按客户端滑动窗口限流
//!
//! ### ③ 流程层（Workflow）
//! - `QuizCtx` - 单跳上下文
//! - `TimeBudget` - 整个请求的时间预算
//! - `QuizFlow` - 重试一次、链式跳转
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/handlers` - axum 路由与请求校验
//! - `orchestrator/server` - 应用生命周期

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{ExtractedTask, QuizRequest, SubmissionResult, SubmitPayload};
pub use orchestrator::{router, App, AppState};
pub use workflow::{QuizCompletion, QuizCtx, QuizFlow};
