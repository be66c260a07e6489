//! 题目提取服务 - 业务能力层
//!
//! 只负责"从页面标记中读出题目"能力：
//! 1. `#result` 元素的可见文本
//! 2. 内联脚本中 `atob(`...`)` 的 base64 载荷（优先）
//! 3. 文本中的提交地址与 PDF 链接

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::models::ExtractedTask;
use crate::utils::logging::truncate_text;

/// 题目容器的 id
pub const RESULT_MARKER: &str = "result";

static ATOB_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"atob\s*\(\s*`([\s\S]*?)`\s*\)").expect("atob pattern"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));
static SUBMIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s"'<>]+/submit"#).expect("submit pattern"));
static PDF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"href=["']([^"']+\.pdf)["']"#).expect("pdf pattern"));

/// 脚本载荷解码失败
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("decoded payload is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// 题目提取器
pub struct TaskExtractor {
    default_submit_url: String,
}

impl TaskExtractor {
    pub fn new(default_submit_url: impl Into<String>) -> Self {
        Self {
            default_submit_url: default_submit_url.into(),
        }
    }

    /// 从页面标记中提取题目
    ///
    /// # 参数
    /// - `html`: 页面源码
    /// - `page_url`: 页面地址，用于解析相对的 PDF 链接
    ///
    /// # 返回
    /// 两条路径都没有拿到文本时返回 `None`
    pub fn extract(&self, html: &str, page_url: &str) -> Option<ExtractedTask> {
        let document = Html::parse_document(html);

        let mut task_text = marker_text(&document).unwrap_or_default();
        if !task_text.is_empty() {
            debug!("#{} 文本长度: {} 字符", RESULT_MARKER, task_text.len());
        }

        if let Some(literal) = first_atob_literal(&document) {
            match decode_atob_literal(&literal) {
                Ok(decoded) => {
                    info!("🔓 已从脚本中解码 base64 题目");
                    task_text = decoded;
                }
                Err(e) => warn!("⚠️ base64 解码失败，保留已有文本: {}", e),
            }
        }

        let task_text = task_text.trim().to_string();
        if task_text.is_empty() {
            return None;
        }

        let submit_url = SUBMIT_RE
            .find(&task_text)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| self.default_submit_url.clone());

        let document_url = PDF_RE
            .captures(&task_text)
            .and_then(|c| c.get(1))
            .map(|m| resolve_link(page_url, m.as_str()));

        info!(
            "📝 题目已提取: {} | 提交 = {} | PDF = {:?}",
            truncate_text(&task_text, 80),
            submit_url,
            document_url
        );

        Some(ExtractedTask {
            task_text,
            submit_url,
            document_url,
        })
    }
}

/// `#result` 的可见文本：逐个文本节点去除首尾空白，丢弃空节点，以换行连接
fn marker_text(document: &Html) -> Option<String> {
    let selector = Selector::parse(&format!("#{}", RESULT_MARKER)).ok()?;
    let element = document.select(&selector).next()?;

    let lines: Vec<&str> = element
        .descendants()
        .filter(|node| {
            !node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|e| matches!(e.name(), "script" | "style" | "noscript"))
            })
        })
        .filter_map(|node| node.value().as_text().map(|t| t.trim()))
        .filter(|t| !t.is_empty())
        .collect();

    Some(lines.join("\n"))
}

/// 所有内联脚本中的第一个 atob 反引号字面量
fn first_atob_literal(document: &Html) -> Option<String> {
    let selector = Selector::parse("script").ok()?;
    document.select(&selector).find_map(|script| {
        let body: String = script.text().collect();
        ATOB_RE
            .captures(&body)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// 去掉所有空白后按标准字母表解码
pub fn decode_atob_literal(literal: &str) -> Result<String, PayloadError> {
    let compact = WHITESPACE_RE.replace_all(literal, "");
    let bytes = STANDARD.decode(compact.as_bytes())?;
    Ok(String::from_utf8(bytes)?)
}

fn resolve_link(page_url: &str, href: &str) -> String {
    Url::parse(page_url)
        .and_then(|base| base.join(href))
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_SUBMIT: &str = "https://grader.example/submit";
    const PAGE: &str = "https://quiz.example/q/1";

    fn extractor() -> TaskExtractor {
        TaskExtractor::new(DEFAULT_SUBMIT)
    }

    fn encode(text: &str) -> String {
        STANDARD.encode(text.as_bytes())
    }

    #[test]
    fn reads_visible_marker_text() {
        let html = r#"<html><body>
            <div id="result">
                <h2>  Q1  </h2>
                <p>What is   the sum?</p>
                <script>var hidden = 1;</script>
                <style>.x { color: red }</style>
            </div>
        </body></html>"#;
        let task = extractor().extract(html, PAGE).unwrap();
        assert_eq!(task.task_text, "Q1\nWhat is   the sum?");
        assert_eq!(task.submit_url, DEFAULT_SUBMIT);
        assert_eq!(task.document_url, None);
    }

    #[test]
    fn decodes_script_payload_with_embedded_whitespace() {
        let secret = "Post the answer to https://grader.example/quiz-7/submit";
        let encoded = encode(secret);
        let (left, right) = encoded.split_at(encoded.len() / 2);
        let html = format!(
            "<html><body><div id=\"result\"></div><script>\n\
             document.querySelector('#result').innerHTML = atob(`{}\n   \r\n{}`);\n\
             </script></body></html>",
            left, right
        );
        let task = extractor().extract(&html, PAGE).unwrap();
        assert_eq!(task.task_text, secret);
        assert_eq!(task.task_text.matches(secret).count(), 1);
        assert_eq!(task.submit_url, "https://grader.example/quiz-7/submit");
    }

    #[test]
    fn payload_replaces_rendered_copy() {
        let secret = "Sum the column";
        let html = format!(
            r#"<div id="result">Sum the column</div><script>x = atob(`{}`)</script>"#,
            encode(secret)
        );
        let task = extractor().extract(&html, PAGE).unwrap();
        assert_eq!(task.task_text, secret);
    }

    #[test]
    fn payload_can_live_in_a_later_script() {
        let html = format!(
            "<script>console.log('boot')</script><script>atob( `{}` )</script>",
            encode("second script task")
        );
        let task = extractor().extract(&html, PAGE).unwrap();
        assert_eq!(task.task_text, "second script task");
    }

    #[test]
    fn malformed_base64_keeps_marker_text() {
        let html = r#"<div id="result">fallback task</div><script>atob(`@@not base64@@`)</script>"#;
        let task = extractor().extract(html, PAGE).unwrap();
        assert_eq!(task.task_text, "fallback task");
    }

    #[test]
    fn non_utf8_payload_is_rejected() {
        let literal = STANDARD.encode([0xff, 0xfe, 0xfd]);
        assert!(matches!(
            decode_atob_literal(&literal),
            Err(PayloadError::Utf8(_))
        ));
    }

    #[test]
    fn nothing_found_yields_none() {
        assert!(extractor().extract("<html><body><p>hi</p></body></html>", PAGE).is_none());
        assert!(extractor().extract("", PAGE).is_none());
        assert!(extractor()
            .extract(r#"<div id="result">   </div><script>atob(`!!`)</script>"#, PAGE)
            .is_none());
        assert!(extractor().extract("<div id='result'><b>unclosed", PAGE).is_some());
    }

    #[test]
    fn finds_pdf_link_and_resolves_relative_href() {
        let payload = r#"Read <a href="/files/report.pdf">this</a> and post to https://grader.example/submit"#;
        let html = format!("<script>atob(`{}`)</script>", encode(payload));
        let task = extractor().extract(&html, PAGE).unwrap();
        assert_eq!(
            task.document_url.as_deref(),
            Some("https://quiz.example/files/report.pdf")
        );
        assert_eq!(task.submit_url, "https://grader.example/submit");
    }

    #[test]
    fn absolute_pdf_link_is_kept() {
        let payload = r#"<a href='https://cdn.example/data.pdf'>data</a>"#;
        let html = format!("<script>atob(`{}`)</script>", encode(payload));
        let task = extractor().extract(&html, "not a url").unwrap();
        assert_eq!(
            task.document_url.as_deref(),
            Some("https://cdn.example/data.pdf")
        );
    }
}
