//! 页面读取器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"等待元素"和"读取源码"的能力

use std::time::Duration;

use chromiumoxide::Page;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::FetchError;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// 页面读取器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 轮询等待标记元素出现
/// - 读取渲染后的页面源码
/// - 不认识题目 / 答案
pub struct PageReader {
    page: Page,
}

impl PageReader {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 等待 `#marker` 出现，超过 `timeout` 返回 [`FetchError::MarkerTimeout`]
    pub async fn wait_for_marker(
        &self,
        url: &str,
        marker: &'static str,
        timeout: Duration,
    ) -> Result<(), FetchError> {
        let selector = format!("#{}", marker);
        let deadline = Instant::now() + timeout;
        loop {
            if self.page.find_element(selector.as_str()).await.is_ok() {
                debug!("{} 已出现", selector);
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(FetchError::MarkerTimeout {
                    url: url.to_string(),
                    marker,
                    waited: timeout,
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// 读取当前 DOM 序列化后的源码
    pub async fn html(&self, url: &str) -> Result<String, FetchError> {
        self.page
            .content()
            .await
            .map_err(|e| FetchError::browser(url, e))
    }
}
