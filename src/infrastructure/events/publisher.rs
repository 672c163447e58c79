//! Event Publisher Implementation
//!
//! WebSocket 事件推送实现

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::application::ports::{EventSinkPort, ReaderEvent};

const CHANNEL_CAPACITY: usize = 100;

/// 事件发布器
pub struct EventPublisher {
    /// session_id -> broadcast sender (for session-specific events)
    session_channels: DashMap<String, broadcast::Sender<ReaderEvent>>,
    /// Global broadcast channel for library events (BookImported/BookDeleted)
    global_channel: broadcast::Sender<ReaderEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (global_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            session_channels: DashMap::new(),
            global_channel: global_tx,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅全局事件
    pub fn subscribe_global(&self) -> broadcast::Receiver<ReaderEvent> {
        self.global_channel.subscribe()
    }

    /// 订阅会话事件，通道不存在时创建
    pub fn register_session(&self, session_id: &str) -> broadcast::Receiver<ReaderEvent> {
        self.session_channels
            .entry(session_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// 取消注册会话
    pub fn unregister_session(&self, session_id: &str) {
        self.session_channels.remove(session_id);
    }

    /// 当前已注册的会话通道数
    pub fn session_channel_count(&self) -> usize {
        self.session_channels.len()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSinkPort for EventPublisher {
    fn publish_session(&self, session_id: &str, event: ReaderEvent) {
        let closing = matches!(event, ReaderEvent::SessionClosed { .. });

        if let Some(sender) = self.session_channels.get(session_id) {
            if let Err(e) = sender.send(event) {
                tracing::debug!(
                    session_id = %session_id,
                    error = %e,
                    "Failed to publish event (no receivers)"
                );
            }
        }

        // 会话结束后订阅者会收到 Closed，随后退出
        if closing {
            self.unregister_session(session_id);
        }
    }

    fn publish_global(&self, event: ReaderEvent) {
        if let Err(e) = self.global_channel.send(event) {
            tracing::debug!(error = %e, "Failed to publish global event (no receivers)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::playback::PlaybackState;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_session_events_are_scoped() {
        let publisher = EventPublisher::new();
        let mut rx_a = publisher.register_session("a");
        let mut rx_b = publisher.register_session("b");

        publisher.publish_session(
            "a",
            ReaderEvent::StateChanged {
                session_id: "a".to_string(),
                book_id: Uuid::nil(),
                state: PlaybackState::Speaking,
            },
        );

        assert!(matches!(
            rx_a.recv().await.unwrap(),
            ReaderEvent::StateChanged { .. }
        ));
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_session_closed_unregisters_channel() {
        let publisher = EventPublisher::new();
        let mut rx = publisher.register_session("a");

        publisher.publish_session(
            "a",
            ReaderEvent::SessionClosed {
                session_id: "a".to_string(),
                reason: "closed".to_string(),
            },
        );

        assert!(matches!(
            rx.recv().await.unwrap(),
            ReaderEvent::SessionClosed { .. }
        ));
        assert_eq!(publisher.session_channel_count(), 0);
        assert!(rx.recv().await.is_err());
    }

    #[tokio::test]
    async fn test_global_broadcast() {
        let publisher = EventPublisher::new();
        let mut rx = publisher.subscribe_global();

        publisher.publish_global(ReaderEvent::BookDeleted { book_id: Uuid::nil() });

        assert_eq!(
            rx.recv().await.unwrap(),
            ReaderEvent::BookDeleted { book_id: Uuid::nil() }
        );
    }
}
