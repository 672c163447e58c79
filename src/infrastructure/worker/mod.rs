//! Worker Layer - Background Task Processing
//!
//! - ProgressWriter: 按顺序写入阅读进度
//! - SessionReaper: 回收空闲会话

mod progress_writer;
mod session_reaper;

pub use progress_writer::{ProgressWriter, ProgressWriterWorker};
pub use session_reaper::{close_all_sessions, SessionReaper, SessionReaperConfig};
