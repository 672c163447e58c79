//! HTTP Middleware
//!
//! 请求日志：HTTP 错误状态码与慢请求

use std::time::{Duration, Instant};

use axum::{extract::Request, middleware::Next, response::Response};

/// 超过此耗时的请求记 warn
const SLOW_REQUEST: Duration = Duration::from_secs(2);

/// HTTP 状态码错误日志中间件
///
/// 4xx/5xx 与慢请求会被记录；业务错误（errno != 0）在 `ApiError::into_response` 中记录。
/// WebSocket 升级请求不计耗时。
pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let is_upgrade = request.headers().contains_key(http::header::UPGRADE);
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            elapsed_ms,
            "HTTP server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            elapsed_ms,
            "HTTP client error"
        );
    } else if !is_upgrade && started.elapsed() > SLOW_REQUEST {
        tracing::warn!(method = %method, uri = %uri, elapsed_ms, "Slow HTTP request");
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        routing::{get, post},
        Router,
    };
    use tower::util::ServiceExt;

    fn create_test_router() -> Router {
        Router::new()
            .route("/ok", get(|| async { "OK" }))
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
            .route("/boom", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .route("/json", post(|axum::Json(v): axum::Json<serde_json::Value>| async move { axum::Json(v) }))
            .layer(axum::middleware::from_fn(error_logging_middleware))
    }

    async fn status_of(request: HttpRequest<Body>) -> StatusCode {
        create_test_router().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_statuses_pass_through() {
        let get = |uri: &str| HttpRequest::builder().uri(uri).body(Body::empty()).unwrap();

        assert_eq!(status_of(get("/ok")).await, StatusCode::OK);
        assert_eq!(status_of(get("/missing")).await, StatusCode::NOT_FOUND);
        assert_eq!(status_of(get("/boom")).await, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_malformed_json_is_client_error() {
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/json")
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        assert!(status_of(request).await.is_client_error());
    }
}
