//! Progress Tracker Port - 阅读进度写入
//!
//! 只写不读，调用方不等待结果；以最后一次写入为准

use uuid::Uuid;

use crate::domain::book::PlaybackPosition;

/// Progress Tracker Port
pub trait ProgressTrackerPort: Send + Sync {
    /// 记录书籍的播放位置（每次 Stop 和会话结束时调用）
    fn persist(&self, book_id: Uuid, position: PlaybackPosition);
}
