//! 单跳上下文
//!
//! 封装"我正在处理第几跳、哪个 URL"这一信息

use std::fmt::Display;

use crate::models::is_demo_url;

#[derive(Debug, Clone)]
pub struct QuizCtx {
    /// 从 1 开始的跳数
    pub hop: usize,
    /// 当前题目页面
    pub url: String,
    pub is_demo: bool,
}

impl QuizCtx {
    pub fn first(url: impl Into<String>) -> Self {
        Self::at(1, url.into())
    }

    /// 链式跳转到下一题
    pub fn next(&self, url: impl Into<String>) -> Self {
        Self::at(self.hop + 1, url.into())
    }

    fn at(hop: usize, url: String) -> Self {
        let is_demo = is_demo_url(&url);
        Self { hop, url, is_demo }
    }
}

impl Display for QuizCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[第 {} 跳 {} {}]",
            self.hop,
            if self.is_demo { "demo" } else { "real" },
            self.url
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_hop_recomputes_demo_flag() {
        let first = QuizCtx::first("https://quiz.example/demo");
        assert!(first.is_demo);
        let second = first.next("https://quiz.example/quiz-2");
        assert_eq!(second.hop, 2);
        assert!(!second.is_demo);
        assert_eq!(second.to_string(), "[第 2 跳 real https://quiz.example/quiz-2]");
    }
}
