//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（SpeechEngine、Repository、SessionManager、ProgressTracker 等）
//! - playback: 每个会话一个的朗读控制器
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod playback;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    // Book commands
    DeleteBook,
    ImportBook,
    // Session commands
    CloseSession,
    ControlPlayback,
    OpenSession,
    OpenSessionResponse,
    PlaybackAction,
    // Handlers
    handlers::{
        CloseSessionHandler, ControlPlaybackHandler, DeleteBookHandler, ImportBookHandler,
        ImportBookResponse, OpenSessionHandler,
    },
};

pub use error::ApplicationError;

pub use playback::{
    PlaybackController, PlaybackError, PlaybackHandle, PlaybackSetup, PlaybackSnapshot,
};

pub use ports::{
    // Repositories
    BookRecord,
    BookRepositoryPort,
    ChapterRecord,
    RepositoryError,
    // Session manager
    Session,
    SessionError,
    SessionManagerPort,
    // Speech engine
    SpeechEngineFactory,
    SpeechEnginePort,
    SpeechError,
    SpeechOptions,
    UtteranceCallback,
    UtteranceCompletion,
    // Progress / events
    EventSinkPort,
    ProgressTrackerPort,
    ReaderEvent,
};

pub use queries::{
    GetBook,
    GetChapter,
    GetSessionStatus,
    ListBooks,
    // Handlers
    handlers::{
        BookDetailResponse, BookSummaryResponse, ChapterEntry, ChapterResponse, GetBookHandler,
        GetChapterHandler, GetSessionStatusHandler, ListBooksHandler,
    },
};
