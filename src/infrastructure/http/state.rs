//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    CloseSessionHandler, ControlPlaybackHandler, DeleteBookHandler, ImportBookHandler,
    OpenSessionHandler,
    // Query handlers
    GetBookHandler, GetChapterHandler, GetSessionStatusHandler, ListBooksHandler,
    // Ports
    BookRepositoryPort, ProgressTrackerPort, SessionManagerPort, SpeechEngineFactory, SpeechOptions,
};
use crate::domain::line_splitter::SplitConfig;
use crate::infrastructure::events::EventPublisher;

/// 构造 Handler 所需的配置项
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub split_config: SplitConfig,
    pub speech_options: SpeechOptions,
    pub min_content_chars: usize,
    pub max_upload_size: u64,
}

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub session_manager: Arc<dyn SessionManagerPort>,
    pub book_repo: Arc<dyn BookRepositoryPort>,
    pub event_publisher: Arc<EventPublisher>,
    pub max_upload_size: u64,

    // ========== Command Handlers ==========
    pub import_book_handler: ImportBookHandler,
    pub delete_book_handler: DeleteBookHandler,
    pub open_session_handler: OpenSessionHandler,
    pub control_playback_handler: ControlPlaybackHandler,
    pub close_session_handler: CloseSessionHandler,

    // ========== Query Handlers ==========
    pub get_book_handler: GetBookHandler,
    pub list_books_handler: ListBooksHandler,
    pub get_chapter_handler: GetChapterHandler,
    pub get_session_status_handler: GetSessionStatusHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        session_manager: Arc<dyn SessionManagerPort>,
        book_repo: Arc<dyn BookRepositoryPort>,
        speech_engines: Arc<dyn SpeechEngineFactory>,
        progress_tracker: Arc<dyn ProgressTrackerPort>,
        event_publisher: Arc<EventPublisher>,
        settings: AppSettings,
    ) -> Self {
        Self {
            // Ports
            session_manager: session_manager.clone(),
            book_repo: book_repo.clone(),
            event_publisher: event_publisher.clone(),
            max_upload_size: settings.max_upload_size,

            // Command handlers
            import_book_handler: ImportBookHandler::new(
                book_repo.clone(),
                event_publisher.clone(),
                settings.min_content_chars,
            ),
            delete_book_handler: DeleteBookHandler::new(
                book_repo.clone(),
                session_manager.clone(),
                event_publisher.clone(),
            ),
            open_session_handler: OpenSessionHandler::new(
                book_repo.clone(),
                session_manager.clone(),
                speech_engines,
                progress_tracker,
                event_publisher.clone(),
                settings.split_config.clone(),
                settings.speech_options,
            ),
            control_playback_handler: ControlPlaybackHandler::new(session_manager.clone()),
            close_session_handler: CloseSessionHandler::new(session_manager.clone()),

            // Query handlers
            get_book_handler: GetBookHandler::new(book_repo.clone()),
            list_books_handler: ListBooksHandler::new(book_repo.clone()),
            get_chapter_handler: GetChapterHandler::new(book_repo, settings.split_config),
            get_session_status_handler: GetSessionStatusHandler::new(session_manager),
        }
    }
}
