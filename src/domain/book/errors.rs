//! Book Context - Errors

use thiserror::Error;

use super::BookId;

#[derive(Debug, Error)]
pub enum BookError {
    #[error("书籍不存在: {0}")]
    NotFound(BookId),

    #[error("无效的标题: {0}")]
    InvalidTitle(String),

    #[error("文件太短或内容为空: {actual} 字符（至少 {min} 字符）")]
    ContentTooShort { actual: usize, min: usize },

    #[error("章节不存在: {0}")]
    ChapterNotFound(usize),
}
