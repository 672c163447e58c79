//! Session Manager Port - 会话生命周期管理
//!
//! 定义会话管理的抽象接口，具体实现在 infrastructure/memory 层

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::application::playback::PlaybackHandle;

/// Session Manager 错误
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Session already exists: {0}")]
    AlreadyExists(String),

    #[error("Session expired: {0}")]
    Expired(String),
}

/// 听书会话（in-memory）
///
/// 每个会话持有一个播放控制器的句柄，一本书同一时刻至多一个会话
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub book_id: Uuid,
    pub handle: PlaybackHandle,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(id: String, book_id: Uuid, handle: PlaybackHandle) -> Self {
        let now = Utc::now();
        Self {
            id,
            book_id,
            handle,
            created_at: now,
            last_activity: now,
        }
    }
}

/// Session Manager Port
///
/// 管理播放会话的生命周期，所有状态存储在内存中
pub trait SessionManagerPort: Send + Sync {
    /// 登记新会话
    fn create(&self, session: Session) -> Result<String, SessionError>;

    /// 获取会话
    fn get(&self, id: &str) -> Result<Session, SessionError>;

    /// 查找某本书的会话
    fn find_by_book(&self, book_id: Uuid) -> Option<Session>;

    /// 检查会话是否有效
    fn is_valid(&self, id: &str) -> bool;

    /// 移除会话并返回它（由调用方负责关闭控制器）
    fn remove(&self, id: &str) -> Result<Session, SessionError>;

    /// 更新最后活动时间
    fn touch(&self, id: &str);

    /// 获取所有过期会话的 ID
    fn get_expired_sessions(&self, idle_timeout_secs: u64) -> Vec<String>;

    /// 获取所有会话 ID
    fn list_all(&self) -> Vec<String>;
}
