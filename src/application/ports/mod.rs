//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod event_sink;
mod progress_tracker;
mod repositories;
mod session_manager;
mod speech_engine;

pub use event_sink::{EventSinkPort, ReaderEvent};
pub use progress_tracker::ProgressTrackerPort;
pub use repositories::{BookRecord, BookRepositoryPort, ChapterRecord, RepositoryError};
pub use session_manager::{Session, SessionError, SessionManagerPort};
pub use speech_engine::{
    SpeechEngineFactory, SpeechEnginePort, SpeechError, SpeechOptions, UtteranceCallback, UtteranceCompletion,
};
