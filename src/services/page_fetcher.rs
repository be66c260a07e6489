//! 页面获取服务 - 业务能力层
//!
//! - 演示题：直接 HTTP GET
//! - 真实题：无头浏览器渲染，等待 `#result` 出现后读取源码

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::browser::{HeadlessSession, LaunchOptions};
use crate::config::Config;
use crate::error::FetchError;
use crate::models::is_demo_url;
use crate::services::task_extractor::RESULT_MARKER;

/// 获取方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// 直接 HTTP GET
    Direct,
    /// 浏览器渲染
    Rendered,
}

impl FetchMode {
    pub fn for_url(url: &str) -> Self {
        if is_demo_url(url) {
            FetchMode::Direct
        } else {
            FetchMode::Rendered
        }
    }
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// 获取页面源码
    async fn fetch(
        &self,
        url: &str,
        mode: FetchMode,
        cancel: &CancellationToken,
    ) -> Result<String, FetchError>;
}

/// 直接 HTTP 获取
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// 只有网络层失败算错误；非 2xx 的页面照常返回，交给提取器判断
    pub async fn get(&self, url: &str, cancel: &CancellationToken) -> Result<String, FetchError> {
        let request = async {
            let response = self.client.get(url).send().await?;
            debug!("GET {} -> {}", url, response.status());
            response.text().await
        };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            result = request => result.map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            }),
        }
    }
}

/// 浏览器渲染获取
///
/// 每次调用独占一个浏览器进程，所有退出路径都会关闭它
pub struct RenderingPageFetcher {
    options: LaunchOptions,
    marker_wait: Duration,
}

impl RenderingPageFetcher {
    pub fn new(options: LaunchOptions, marker_wait: Duration) -> Self {
        Self {
            options,
            marker_wait,
        }
    }

    pub async fn render(&self, url: &str, cancel: &CancellationToken) -> Result<String, FetchError> {
        let session = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            session = HeadlessSession::launch(&self.options) => session?,
        };

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            html = self.read_rendered(&session, url) => html,
        };

        session.close().await;
        result
    }

    async fn read_rendered(&self, session: &HeadlessSession, url: &str) -> Result<String, FetchError> {
        let reader = session.open(url).await?;
        reader
            .wait_for_marker(url, RESULT_MARKER, self.marker_wait)
            .await?;
        reader.html(url).await
    }
}

/// 按 [`FetchMode`] 分派的页面获取器
pub struct QuizPageFetcher {
    http: HttpPageFetcher,
    renderer: RenderingPageFetcher,
}

impl QuizPageFetcher {
    pub fn new(http: HttpPageFetcher, renderer: RenderingPageFetcher) -> Self {
        Self { http, renderer }
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            HttpPageFetcher::new(config.fetch_timeout())?,
            RenderingPageFetcher::new(LaunchOptions::from_config(config), config.render_wait()),
        ))
    }
}

#[async_trait]
impl PageFetcher for QuizPageFetcher {
    async fn fetch(
        &self,
        url: &str,
        mode: FetchMode,
        cancel: &CancellationToken,
    ) -> Result<String, FetchError> {
        match mode {
            FetchMode::Direct => {
                info!("📄 演示题：直接请求页面");
                self.http.get(url, cancel).await
            }
            FetchMode::Rendered => {
                info!("🖥️ 真实题：浏览器渲染页面");
                self.renderer.render(url, cancel).await
            }
        }
    }
}
