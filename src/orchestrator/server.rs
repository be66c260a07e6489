//! 应用生命周期 - 编排层
//!
//! 1. **初始化**：按配置组装 fetcher / solver / submitter，输出启动信息
//! 2. **运行**：绑定端口并提供 HTTP 服务，Ctrl-C 时优雅退出

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::Config;
use crate::orchestrator::handlers::{router, AppState};
use crate::services::{
    rate_limiter::DEFAULT_WINDOW, DocumentService, HttpAnswerSubmitter, LlmService,
    QuizPageFetcher, RateLimiter, TaskExtractor,
};
use crate::utils::logging::log_startup;
use crate::workflow::{FlowSettings, QuizFlow};

impl AppState {
    /// 用真实协作者组装状态
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = QuizPageFetcher::from_config(config).context("创建页面获取器失败")?;
        let documents = if config.fetch_documents {
            Some(DocumentService::new(config.fetch_timeout()).context("创建文档服务失败")?)
        } else {
            None
        };
        let solver = LlmService::new(config, documents);
        let submitter = HttpAnswerSubmitter::from_config(config).context("创建提交器失败")?;

        let flow = QuizFlow::new(
            FlowSettings::from_config(config),
            TaskExtractor::new(config.default_submit_url.clone()),
            Arc::new(fetcher),
            Arc::new(solver),
            Arc::new(submitter),
        );

        // 0 表示不限流
        let limiter = (config.rate_limit_max > 0)
            .then(|| Arc::new(RateLimiter::new(config.rate_limit_max, DEFAULT_WINDOW)));

        Ok(Self::new(Arc::new(flow), limiter, config.max_time()))
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    state: AppState,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        if config.llm_api_key.is_none() {
            warn!("⚠️ 未配置 OPENAI_API_KEY，非 demo 题目将提交 \"Error solving\"");
        }

        let state = AppState::from_config(&config)?;
        Ok(Self { config, state })
    }

    /// 运行 HTTP 服务直到收到 Ctrl-C
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.bind_addr)
            .await
            .with_context(|| format!("无法绑定 {}", self.config.bind_addr))?;
        info!("🚀 服务已启动: http://{}", listener.local_addr()?);

        axum::serve(
            listener,
            router(self.state).into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP 服务异常退出")?;

        info!("👋 服务已停止");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("监听 Ctrl-C 失败: {}", e);
        std::future::pending::<()>().await;
    }
    info!("收到退出信号，等待进行中的请求结束...");
}
