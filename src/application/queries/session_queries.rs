//! Session Queries

/// 获取会话播放状态查询
#[derive(Debug, Clone)]
pub struct GetSessionStatus {
    pub session_id: String,
}
