use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// 请求日志中间件
pub async fn request_logging(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let start_time = Instant::now();
    tracing::debug!("Request started: {} {} [{}]", method, uri, request_id);

    let response = next.run(req).await;

    tracing::info!(
        "Request completed: {} {} - {} - {:.3}ms [{}]",
        method,
        uri,
        response.status(),
        start_time.elapsed().as_secs_f64() * 1000.0,
        request_id
    );

    response
}
