//! HTTP Middleware

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// 4xx / 5xx 状态码日志
///
/// 业务错误以 HTTP 200 + errno 返回，在 `ApiError::into_response` 中记录；
/// 这里只覆盖路由不匹配、方法不允许等框架层错误
pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if response.status().is_server_error() {
        tracing::error!(%method, %uri, status, elapsed_ms, "HTTP server error");
    } else if response.status().is_client_error() {
        tracing::warn!(%method, %uri, status, elapsed_ms, "HTTP client error");
    }

    response
}
