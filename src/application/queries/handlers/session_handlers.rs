//! Session Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::playback::PlaybackSnapshot;
use crate::application::ports::SessionManagerPort;
use crate::application::queries::GetSessionStatus;

/// GetSessionStatus Handler
pub struct GetSessionStatusHandler {
    session_manager: Arc<dyn SessionManagerPort>,
}

impl GetSessionStatusHandler {
    pub fn new(session_manager: Arc<dyn SessionManagerPort>) -> Self {
        Self { session_manager }
    }

    pub async fn handle(&self, query: GetSessionStatus) -> Result<PlaybackSnapshot, ApplicationError> {
        let session = self.session_manager.get(&query.session_id)?;
        Ok(session.handle.status().await?)
    }
}
