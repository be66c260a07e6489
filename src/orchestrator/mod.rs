//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `server` - 应用生命周期
//! - 按配置组装所有协作者
//! - 绑定端口、提供 HTTP 服务、优雅退出
//!
//! ### `handlers` - HTTP 入口
//! - 请求校验与限流
//! - 把流程放进独立任务，超时后取消
//!
//! ## 层次关系
//!
//! ```text
//! server (App)
//!     ↓
//! handlers (POST /quiz, /ping)
//!     ↓
//! workflow::QuizFlow (处理一次请求的所有跳)
//!     ↓
//! services (获取 / 提取 / 解题 / 提交 / 限流)
//!     ↓
//! infrastructure (PageReader)
//! ```

pub mod handlers;
pub mod server;

pub use handlers::{router, AppState};
pub use server::App;
