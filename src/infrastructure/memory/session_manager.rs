//! In-Memory Session Manager Implementation

use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::ports::{Session, SessionError, SessionManagerPort};

/// 内存会话管理器
pub struct InMemorySessionManager {
    sessions: DashMap<String, Session>,
}

impl InMemorySessionManager {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Default for InMemorySessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManagerPort for InMemorySessionManager {
    fn create(&self, session: Session) -> Result<String, SessionError> {
        let session_id = session.id.clone();
        if self.sessions.contains_key(&session_id) {
            return Err(SessionError::AlreadyExists(session_id));
        }
        let book_id = session.book_id;
        self.sessions.insert(session_id.clone(), session);
        tracing::info!(session_id = %session_id, book_id = %book_id, "Session created");
        Ok(session_id)
    }

    fn get(&self, id: &str) -> Result<Session, SessionError> {
        self.sessions
            .get(id)
            .map(|s| s.clone())
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    fn find_by_book(&self, book_id: Uuid) -> Option<Session> {
        self.sessions
            .iter()
            .find(|entry| entry.book_id == book_id)
            .map(|entry| entry.value().clone())
    }

    fn is_valid(&self, id: &str) -> bool {
        self.sessions
            .get(id)
            .map(|s| !s.handle.is_closed())
            .unwrap_or(false)
    }

    fn remove(&self, id: &str) -> Result<Session, SessionError> {
        self.sessions
            .remove(id)
            .map(|(_, session)| {
                tracing::info!(session_id = %id, "Session removed");
                session
            })
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    fn touch(&self, id: &str) {
        if let Some(mut session) = self.sessions.get_mut(id) {
            session.last_activity = Utc::now();
        }
    }

    fn get_expired_sessions(&self, idle_timeout_secs: u64) -> Vec<String> {
        let now = Utc::now();
        let timeout = chrono::Duration::seconds(idle_timeout_secs as i64);

        self.sessions
            .iter()
            .filter_map(|entry| {
                let elapsed = now - entry.last_activity;
                if elapsed > timeout {
                    Some(entry.key().clone())
                } else {
                    None
                }
            })
            .collect()
    }

    fn list_all(&self) -> Vec<String> {
        self.sessions.iter().map(|e| e.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::playback::PlaybackHandle;

    fn session(id: &str, book_id: Uuid) -> Session {
        Session::new(id.to_string(), book_id, PlaybackHandle::detached(id))
    }

    #[test]
    fn test_session_lifecycle() {
        let manager = InMemorySessionManager::new();
        let book_id = Uuid::new_v4();

        // Create
        let session_id = manager.create(session("s1", book_id)).unwrap();
        assert!(manager.create(session("s1", book_id)).is_err());

        // Get / find by book
        assert_eq!(manager.get(&session_id).unwrap().book_id, book_id);
        assert_eq!(manager.find_by_book(book_id).unwrap().id, "s1");
        assert!(manager.find_by_book(Uuid::new_v4()).is_none());
        assert_eq!(manager.list_all(), vec!["s1".to_string()]);

        // Remove
        let removed = manager.remove(&session_id).unwrap();
        assert_eq!(removed.id, "s1");
        assert!(manager.get(&session_id).is_err());
        assert!(manager.remove(&session_id).is_err());
    }

    #[test]
    fn test_detached_handle_is_not_valid() {
        let manager = InMemorySessionManager::new();
        manager.create(session("s1", Uuid::new_v4())).unwrap();

        assert!(!manager.is_valid("s1"));
        assert!(!manager.is_valid("missing"));
    }

    #[test]
    fn test_expired_sessions() {
        let manager = InMemorySessionManager::new();
        let mut stale = session("old", Uuid::new_v4());
        stale.last_activity = Utc::now() - chrono::Duration::seconds(600);
        manager.create(stale).unwrap();
        manager.create(session("fresh", Uuid::new_v4())).unwrap();

        assert_eq!(manager.get_expired_sessions(300), vec!["old".to_string()]);

        manager.touch("old");
        assert!(manager.get_expired_sessions(300).is_empty());
    }
}
