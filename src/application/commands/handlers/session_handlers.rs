//! Session Command Handlers - 会话生命周期与播放控制

use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::application::commands::session_commands::*;
use crate::application::error::ApplicationError;
use crate::application::playback::{PlaybackController, PlaybackSetup, PlaybackSnapshot};
use crate::application::ports::{
    BookRepositoryPort, EventSinkPort, ProgressTrackerPort, Session, SessionManagerPort,
    SpeechEngineFactory, SpeechOptions,
};
use crate::domain::line_splitter::{LineSplitter, SplitConfig};

/// OpenSession Handler - 创建或复用会话
///
/// 新会话从书籍保存的进度开始，控制器作为独立任务运行，
/// 并独占一个新领取的引擎实例
pub struct OpenSessionHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
    session_manager: Arc<dyn SessionManagerPort>,
    engines: Arc<dyn SpeechEngineFactory>,
    progress: Arc<dyn ProgressTrackerPort>,
    events: Arc<dyn EventSinkPort>,
    split_config: SplitConfig,
    speech_options: SpeechOptions,
    // 串行化 open，保证一本书至多一个控制器
    open_lock: Mutex<()>,
}

impl OpenSessionHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        book_repo: Arc<dyn BookRepositoryPort>,
        session_manager: Arc<dyn SessionManagerPort>,
        engines: Arc<dyn SpeechEngineFactory>,
        progress: Arc<dyn ProgressTrackerPort>,
        events: Arc<dyn EventSinkPort>,
        split_config: SplitConfig,
        speech_options: SpeechOptions,
    ) -> Self {
        Self {
            book_repo,
            session_manager,
            engines,
            progress,
            events,
            split_config,
            speech_options,
            open_lock: Mutex::new(()),
        }
    }

    pub async fn handle(&self, cmd: OpenSession) -> Result<OpenSessionResponse, ApplicationError> {
        let _guard = self.open_lock.lock().await;

        if let Some(existing) = self.session_manager.find_by_book(cmd.book_id) {
            match existing.handle.status().await {
                Ok(snapshot) => {
                    self.session_manager.touch(&existing.id);
                    tracing::debug!(session_id = %existing.id, book_id = %cmd.book_id, "Session reused");
                    return Ok(OpenSessionResponse {
                        session_id: existing.id,
                        reused: true,
                        snapshot,
                    });
                }
                Err(e) => {
                    tracing::warn!(session_id = %existing.id, error = %e, "Dropping dead session");
                    let _ = self.session_manager.remove(&existing.id);
                }
            }
        }

        let record = self
            .book_repo
            .find_by_id(cmd.book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", cmd.book_id))?;
        let chapters = self.book_repo.find_chapters(cmd.book_id).await?;
        let book = record.into_book(chapters)?;

        let session_id = Uuid::new_v4().to_string();
        let setup = PlaybackSetup {
            session_id: session_id.clone(),
            book_id: cmd.book_id,
            chapters: book.chapters().to_vec(),
            start: book.position(),
            splitter: LineSplitter::new(self.split_config.clone()),
            options: self.speech_options.clone(),
        };
        let (controller, handle) = PlaybackController::new(
            setup,
            self.engines.create(),
            self.progress.clone(),
            self.events.clone(),
        );
        tokio::spawn(controller.run());

        self.session_manager
            .create(Session::new(session_id.clone(), cmd.book_id, handle.clone()))?;
        let snapshot = handle.status().await?;

        tracing::info!(
            session_id = %session_id,
            book_id = %cmd.book_id,
            position = %snapshot.position,
            "Session opened"
        );

        Ok(OpenSessionResponse {
            session_id,
            reused: false,
            snapshot,
        })
    }
}

/// ControlPlayback Handler - 把播放动作转发给会话的控制器
pub struct ControlPlaybackHandler {
    session_manager: Arc<dyn SessionManagerPort>,
}

impl ControlPlaybackHandler {
    pub fn new(session_manager: Arc<dyn SessionManagerPort>) -> Self {
        Self { session_manager }
    }

    pub async fn handle(&self, cmd: ControlPlayback) -> Result<PlaybackSnapshot, ApplicationError> {
        let session = self.session_manager.get(&cmd.session_id)?;
        self.session_manager.touch(&cmd.session_id);

        let handle = &session.handle;
        let snapshot = match cmd.action {
            PlaybackAction::Play => handle.play().await?,
            PlaybackAction::Stop => handle.stop().await?,
            PlaybackAction::SkipForward => handle.skip_forward().await?,
            PlaybackAction::SkipBackward => handle.skip_backward().await?,
            PlaybackAction::SeekTo(position) => handle.seek_to(position).await?,
            PlaybackAction::SetRate(rate) => handle.set_rate(rate).await?,
        };

        tracing::debug!(
            session_id = %cmd.session_id,
            action = ?cmd.action,
            state = snapshot.state.as_str(),
            position = %snapshot.position,
            "Playback action applied"
        );

        Ok(snapshot)
    }
}

/// CloseSession Handler - 停止朗读、写入进度并移除会话
pub struct CloseSessionHandler {
    session_manager: Arc<dyn SessionManagerPort>,
}

impl CloseSessionHandler {
    pub fn new(session_manager: Arc<dyn SessionManagerPort>) -> Self {
        Self { session_manager }
    }

    pub async fn handle(&self, cmd: CloseSession) -> Result<Option<PlaybackSnapshot>, ApplicationError> {
        let session = self.session_manager.remove(&cmd.session_id)?;

        let snapshot = match session.handle.close().await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::debug!(session_id = %cmd.session_id, error = %e, "Controller already gone");
                None
            }
        };

        tracing::info!(session_id = %cmd.session_id, book_id = %session.book_id, "Session closed");
        Ok(snapshot)
    }
}
