//! HTTP 入口
//!
//! - `POST /quiz`：校验请求、限流，然后在独立任务中运行流程并等待（带超时）
//! - `GET|POST /ping`：存活检查

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::error::{AppError, AppResult};
use crate::models::QuizRequest;
use crate::services::RateLimiter;
use crate::workflow::{QuizCompletion, QuizFlow};

/// 路由共享状态
#[derive(Clone)]
pub struct AppState {
    flow: Arc<QuizFlow>,
    limiter: Option<Arc<RateLimiter>>,
    max_time: Duration,
}

impl AppState {
    pub fn new(flow: Arc<QuizFlow>, limiter: Option<Arc<RateLimiter>>, max_time: Duration) -> Self {
        Self {
            flow,
            limiter,
            max_time,
        }
    }

    /// 在独立任务中运行流程，最多等待 `max_time`
    ///
    /// 超时后通过取消令牌通知工作任务尽快退出；工作任务只通过自己的
    /// `JoinHandle` 回传结果，超时后该句柄被丢弃。
    pub async fn dispatch(&self, request: QuizRequest) -> AppResult<QuizCompletion> {
        let cancel = CancellationToken::new();
        let flow = Arc::clone(&self.flow);
        let token = cancel.clone();
        let worker = tokio::spawn(async move { flow.run(request, token).await });

        match tokio::time::timeout(self.max_time, worker).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_error)) => {
                error!("工作任务异常退出: {}", join_error);
                Err(AppError::Internal(join_error.to_string()))
            }
            Err(_) => {
                cancel.cancel();
                error!("⏱️ 超过 {:?} 仍未完成，已请求取消", self.max_time);
                Err(AppError::Timeout)
            }
        }
    }

    fn allow(&self, key: &str) -> bool {
        self.limiter.as_ref().map_or(true, |limiter| limiter.check(key))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/quiz", post(quiz_handler))
        .route("/ping", get(ping_handler).post(ping_handler))
        .with_state(state)
}

async fn ping_handler() -> Json<Value> {
    Json(json!({ "status": "alive" }))
}

#[instrument(skip_all)]
async fn quiz_handler(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let key = client_key(&headers, peer.map(|ConnectInfo(addr)| addr));
    if !state.allow(&key) {
        warn!("🚫 {} 请求过于频繁", key);
        return AppError::RateLimited.into_response();
    }

    let request = match parse_quiz_request(&headers, &body) {
        Ok(request) => request,
        Err(e) => {
            warn!("请求无效 ({}): {}", key, e);
            return e.into_response();
        }
    };
    info!("📨 收到请求 {} -> {}", request.email, request.url);

    match state.dispatch(request).await {
        Ok(done) => (StatusCode::OK, Json(done.to_json())).into_response(),
        Err(e) => e.into_response(),
    }
}

/// 只接受 `application/json`（含 `+json`）请求体
fn parse_quiz_request(headers: &HeaderMap, body: &[u8]) -> AppResult<QuizRequest> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
        })
        .unwrap_or(false);
    if !is_json {
        return Err(AppError::json_required());
    }

    let value: Value = serde_json::from_slice(body).map_err(|_| AppError::json_required())?;
    QuizRequest::from_json(&value)
}

/// 限流 key：优先取 `X-Forwarded-For` 的第一跳
fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}
