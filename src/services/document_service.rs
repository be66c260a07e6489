//! 文档服务 - 业务能力层
//!
//! 下载题目引用的 PDF，并给出一个粗略的数值提示。
//! 不做真正的 PDF 解析，结果仅供 LLM 参考。

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\b\d+(?:\.\d+)?\b").expect("number pattern"));

/// 单个可打印片段至少多长才参与统计
const MIN_RUN_LEN: usize = 4;

pub struct DocumentService {
    client: reqwest::Client,
}

impl DocumentService {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// 下载文档并生成提示，任何失败都返回 `None`
    pub async fn fetch_hint(&self, url: &str, cancel: &CancellationToken) -> Option<String> {
        let download = async {
            let response = self.client.get(url).send().await?.error_for_status()?;
            response.bytes().await
        };
        let bytes = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            result = download => match result {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("⚠️ 文档下载失败 {}: {}", url, e);
                    return None;
                }
            },
        };
        debug!("文档 {} 大小: {} 字节", url, bytes.len());
        naive_hint(&bytes)
    }
}

/// 统计文档可打印片段中出现的数字个数与总和
pub fn naive_hint(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let numbers: Vec<f64> = text
        .split(|c: char| (c.is_control() && c != '\n' && c != '\t') || c == '\u{FFFD}')
        .filter(|run| run.trim().len() >= MIN_RUN_LEN)
        .flat_map(|run| NUMBER_RE.find_iter(run))
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect();

    if numbers.is_empty() {
        return None;
    }
    let sum: f64 = numbers.iter().sum();
    Some(format!("{} numbers found, sum = {}", numbers.len(), sum))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_numbers_in_printable_text() {
        let hint = naive_hint(b"value 10\nvalue 20.5\nvalue -0.5").unwrap();
        assert_eq!(hint, "3 numbers found, sum = 30");
    }

    #[test]
    fn binary_noise_gives_no_hint() {
        assert_eq!(naive_hint(&[0xff, 0x00, 0x01, 0xfe]), None);
        assert_eq!(naive_hint(b"no digits here"), None);
    }

    #[tokio::test]
    async fn unreachable_document_gives_no_hint() {
        let service = DocumentService::new(Duration::from_secs(1)).unwrap();
        let hint = service
            .fetch_hint("http://127.0.0.1:9/report.pdf", &CancellationToken::new())
            .await;
        assert_eq!(hint, None);
    }
}
