//! Domain Layer - 领域层
//!
//! - Book Context: 书籍、章节、播放位置
//! - Playback: 顺序朗读状态机
//! - 分章器与行分割器

pub mod book;
pub mod playback;

pub mod chapter_segmenter;
pub mod line_splitter;

pub use chapter_segmenter::{segment_chapters, MAIN_TEXT_TITLE, PROLOGUE_TITLE};
pub use line_splitter::{split_lines, LineSplitter, SplitConfig, SplitMode};
