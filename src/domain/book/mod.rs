//! Book Context - 书籍限界上下文
//!
//! 职责:
//! - 书籍聚合管理（导入、分章、阅读进度）
//! - 章节实体
//! - 播放位置值对象

mod aggregate;
mod entities;
mod errors;
mod value_objects;

pub use aggregate::{Book, DEFAULT_MIN_CONTENT_CHARS};
pub use entities::Chapter;
pub use errors::BookError;
pub use value_objects::{BookId, PlaybackPosition, Title};
