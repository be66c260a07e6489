use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::FetchError;
use crate::infrastructure::PageReader;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36";

const WEBDRIVER_OVERRIDE: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => false});";

/// 浏览器启动参数
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub chrome_executable: Option<PathBuf>,
}

impl LaunchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            headless: config.headless,
            chrome_executable: config.chrome_executable.as_ref().map(PathBuf::from),
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig, FetchError> {
        let mut builder = BrowserConfig::builder();
        if self.headless {
            builder = builder.new_headless_mode();
        } else {
            builder = builder.with_head();
        }
        if let Some(path) = &self.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        let user_agent = format!("--user-agent={}", USER_AGENT);
        builder
            .args(vec![
                "--no-sandbox",
                "--disable-dev-shm-usage",
                "--disable-gpu",
                "--window-size=1920,1080",
                "--disable-blink-features=AutomationControlled",
                "--remote-debugging-port=0",
                user_agent.as_str(),
            ])
            .build()
            .map_err(|e| {
                error!("配置无头浏览器失败: {}", e);
                FetchError::Launch(e)
            })
    }
}

/// 单次渲染使用的浏览器会话
///
/// 每一跳独占一个浏览器进程，用完后调用 [`HeadlessSession::close`]；
/// 被提前丢弃时由 chromiumoxide 的 `Drop` 结束子进程。
pub struct HeadlessSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl HeadlessSession {
    /// 启动无头浏览器
    pub async fn launch(options: &LaunchOptions) -> Result<Self, FetchError> {
        info!("🚀 启动无头浏览器...");
        let config = options.browser_config()?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            error!("启动无头浏览器失败: {}", e);
            FetchError::Launch(e.to_string())
        })?;
        debug!("无头浏览器启动成功");

        // 在后台处理浏览器事件
        let handler = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        // 添加短暂延迟以等待浏览器状态同步
        sleep(Duration::from_millis(300)).await;

        Ok(Self { browser, handler })
    }

    /// 打开新页面并导航到指定 URL
    ///
    /// 导航前注入脚本隐藏 `navigator.webdriver`
    pub async fn open(&self, url: &str) -> Result<PageReader, FetchError> {
        let page = self.browser.new_page("about:blank").await.map_err(|e| {
            error!("创建页面失败: {}", e);
            FetchError::browser(url, e)
        })?;

        page.evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(
            WEBDRIVER_OVERRIDE,
        ))
        .await
        .map_err(|e| FetchError::browser(url, e))?;

        page.goto(url).await.map_err(|e| {
            error!("导航到 {} 失败: {}", url, e);
            FetchError::browser(url, e)
        })?;
        info!("✅ 无头浏览器已导航到: {}", url);

        Ok(PageReader::new(page))
    }

    /// 关闭浏览器并等待进程退出
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("关闭浏览器失败: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("等待浏览器退出失败: {}", e);
        }
        debug!("浏览器已关闭");
    }
}

impl Drop for HeadlessSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
