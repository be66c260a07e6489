//! 时间预算
//!
//! 所有"是否还能再发起一轮网络往返"的判断都集中在这里

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
pub struct TimeBudget {
    started: Instant,
    ceiling: Duration,
}

impl TimeBudget {
    pub fn start(ceiling: Duration) -> Self {
        Self {
            started: Instant::now(),
            ceiling,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn remaining(&self) -> Duration {
        self.ceiling.saturating_sub(self.elapsed())
    }

    pub fn is_exhausted(&self) -> bool {
        self.elapsed() >= self.ceiling
    }

    /// 已用时间小于 `ceiling - margin` 时才允许继续
    pub fn allows(&self, margin: Duration) -> bool {
        self.elapsed() < self.ceiling.saturating_sub(margin)
    }
}
