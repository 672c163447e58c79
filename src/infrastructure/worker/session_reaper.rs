//! Session Reaper - 回收空闲会话
//!
//! 长时间没有操作且没有在朗读的会话会被关闭，关闭时照常写入进度

use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::SessionManagerPort;
use crate::domain::playback::PlaybackState;

/// Reaper 配置
#[derive(Debug, Clone)]
pub struct SessionReaperConfig {
    /// 空闲超时（秒）
    pub idle_timeout_secs: u64,
    /// 扫描间隔
    pub interval: Duration,
}

impl Default for SessionReaperConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 1800,
            interval: Duration::from_secs(60),
        }
    }
}

/// 空闲会话回收器
pub struct SessionReaper {
    config: SessionReaperConfig,
    session_manager: Arc<dyn SessionManagerPort>,
}

impl SessionReaper {
    pub fn new(config: SessionReaperConfig, session_manager: Arc<dyn SessionManagerPort>) -> Self {
        Self {
            config,
            session_manager,
        }
    }

    /// 启动周期扫描
    pub async fn run(self) {
        tracing::info!(
            idle_timeout_secs = self.config.idle_timeout_secs,
            interval_secs = self.config.interval.as_secs(),
            "SessionReaper started"
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        // 第一次 tick 立即返回
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let reaped = self.reap_once().await;
            if reaped > 0 {
                tracing::info!(reaped, "Idle sessions closed");
            }
        }
    }

    /// 扫描一次，返回关闭的会话数
    pub async fn reap_once(&self) -> usize {
        let mut reaped = 0;

        for session_id in self
            .session_manager
            .get_expired_sessions(self.config.idle_timeout_secs)
        {
            let Ok(session) = self.session_manager.get(&session_id) else {
                continue;
            };

            // 正在朗读的会话不算空闲
            if let Ok(snapshot) = session.handle.status().await {
                if snapshot.state == PlaybackState::Speaking {
                    self.session_manager.touch(&session_id);
                    continue;
                }
            }

            if let Ok(session) = self.session_manager.remove(&session_id) {
                let _ = session.handle.close().await;
                tracing::info!(session_id = %session_id, book_id = %session.book_id, "Idle session reaped");
                reaped += 1;
            }
        }

        reaped
    }
}

/// 关闭所有会话（服务退出时调用）
pub async fn close_all_sessions(session_manager: &dyn SessionManagerPort) -> usize {
    let mut closed = 0;
    for session_id in session_manager.list_all() {
        if let Ok(session) = session_manager.remove(&session_id) {
            if session.handle.close().await.is_ok() {
                closed += 1;
            }
        }
    }
    closed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::playback::PlaybackHandle;
    use crate::application::ports::Session;
    use crate::infrastructure::memory::InMemorySessionManager;
    use chrono::Utc;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_reaps_only_expired_sessions() {
        let manager = Arc::new(InMemorySessionManager::new());

        let mut stale = Session::new("old".to_string(), Uuid::new_v4(), PlaybackHandle::detached("old"));
        stale.last_activity = Utc::now() - chrono::Duration::seconds(120);
        manager.create(stale).unwrap();
        manager
            .create(Session::new("fresh".to_string(), Uuid::new_v4(), PlaybackHandle::detached("fresh")))
            .unwrap();

        let reaper = SessionReaper::new(
            SessionReaperConfig {
                idle_timeout_secs: 60,
                interval: Duration::from_secs(1),
            },
            manager.clone(),
        );

        assert_eq!(reaper.reap_once().await, 1);
        assert_eq!(manager.list_all(), vec!["fresh".to_string()]);
    }
}
