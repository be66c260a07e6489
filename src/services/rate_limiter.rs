//! 按来源地址的滑动窗口限流

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// 滑动窗口限流器
///
/// 每个 key 保存窗口内的请求时间戳。每次检查先淘汰所有 key 中过期的时间戳
/// 并移除空 key，再判断当前 key 是否已达上限。
pub struct RateLimiter {
    window: Duration,
    max_requests: usize,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            window,
            max_requests,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// 记录一次请求；窗口内已有 `max_requests` 次时拒绝
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut hits = self.hits.lock();

        hits.retain(|_, stamps| {
            while stamps
                .front()
                .is_some_and(|t| now.saturating_duration_since(*t) >= self.window)
            {
                stamps.pop_front();
            }
            !stamps.is_empty()
        });

        let stamps = hits.entry(key.to_string()).or_default();
        if stamps.len() >= self.max_requests {
            debug!("来源 {} 已触发限流 ({} 次)", key, stamps.len());
            return false;
        }
        stamps.push_back(now);
        true
    }

    /// 当前仍在跟踪的 key 数量
    pub fn tracked_keys(&self) -> usize {
        self.hits.lock().len()
    }
}
