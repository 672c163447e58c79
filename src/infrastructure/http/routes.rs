//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                   GET   健康检查
//! - /api/book/upload            POST  上传 TXT 导入书籍（multipart）
//! - /api/book/import            POST  以 JSON 正文导入书籍
//! - /api/book/list              GET   书架（最近阅读在前）
//! - /api/book/get               POST  书籍详情与目录
//! - /api/book/chapter           POST  章节朗读单位
//! - /api/book/delete            POST  删除书籍
//! - /api/session/open           POST  打开会话（按书复用）
//! - /api/session/play           POST  从当前位置开始朗读
//! - /api/session/stop           POST  停止朗读
//! - /api/session/skip_forward   POST  下一行
//! - /api/session/skip_backward  POST  上一行
//! - /api/session/seek           POST  跳转到章节/行
//! - /api/session/rate           POST  设置语速
//! - /api/session/status         POST  查询播放状态
//! - /api/session/close          POST  关闭会话
//! - /ws/session/{id}            WS    会话事件
//! - /ws/events                  WS    书库事件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/session/:session_id", get(handlers::websocket_handler))
        .route("/ws/events", get(handlers::global_websocket_handler))
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/book", book_routes())
        .nest("/session", session_routes())
}

fn book_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload", post(handlers::upload_book))
        .route("/import", post(handlers::import_book))
        .route("/list", get(handlers::list_books))
        .route("/get", post(handlers::get_book))
        .route("/chapter", post(handlers::get_chapter))
        .route("/delete", post(handlers::delete_book))
}

fn session_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/open", post(handlers::open_session))
        .route("/play", post(handlers::play))
        .route("/stop", post(handlers::stop))
        .route("/skip_forward", post(handlers::skip_forward))
        .route("/skip_backward", post(handlers::skip_backward))
        .route("/seek", post(handlers::seek))
        .route("/rate", post(handlers::set_rate))
        .route("/status", post(handlers::session_status))
        .route("/close", post(handlers::close_session))
}
