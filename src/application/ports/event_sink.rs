//! Event Sink Port - 事件推送抽象
//!
//! 会话事件只推送给该会话的订阅者，书库事件全局广播

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::playback::PlaybackState;

/// 推送给客户端的事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ReaderEvent {
    /// 播放状态变化
    StateChanged {
        session_id: String,
        book_id: Uuid,
        state: PlaybackState,
    },
    /// 播放位置变化
    PositionChanged {
        session_id: String,
        book_id: Uuid,
        chapter_index: usize,
        line_index: usize,
    },
    /// 开始朗读一行
    Speaking {
        session_id: String,
        chapter_index: usize,
        line_index: usize,
        text: String,
    },
    /// 朗读失败，播放已停止
    PlaybackFailed {
        session_id: String,
        error: String,
    },
    /// 已读完全书
    Finished {
        session_id: String,
        book_id: Uuid,
    },
    /// 会话关闭
    SessionClosed {
        session_id: String,
        reason: String,
    },
    /// 书籍导入完成
    BookImported {
        book_id: Uuid,
        title: String,
        total_chapters: usize,
    },
    /// 书籍已删除
    BookDeleted {
        book_id: Uuid,
    },
}

impl ReaderEvent {
    /// 是否为全局书库事件
    pub fn is_global(&self) -> bool {
        matches!(
            self,
            ReaderEvent::BookImported { .. } | ReaderEvent::BookDeleted { .. }
        )
    }
}

/// Event Sink Port
pub trait EventSinkPort: Send + Sync {
    /// 推送到指定会话的订阅者
    fn publish_session(&self, session_id: &str, event: ReaderEvent);

    /// 全局广播
    fn publish_global(&self, event: ReaderEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let event = ReaderEvent::StateChanged {
            session_id: "s1".to_string(),
            book_id: Uuid::nil(),
            state: PlaybackState::Speaking,
        };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "StateChanged");
        assert_eq!(json["data"]["state"], "speaking");
        assert!(!event.is_global());
    }

    #[test]
    fn test_library_events_are_global() {
        assert!(ReaderEvent::BookDeleted { book_id: Uuid::nil() }.is_global());
    }
}
