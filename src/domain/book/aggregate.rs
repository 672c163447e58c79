//! Book Context - Aggregate Root

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookError, BookId, Chapter, PlaybackPosition, Title};
use crate::domain::chapter_segmenter::segment_chapters;

/// 导入时要求的最少字符数，低于此值视为空文件
pub const DEFAULT_MIN_CONTENT_CHARS: usize = 50;

/// Book 聚合根
///
/// 不变量:
/// - 至少包含一个章节（分章器总会回退为单章）
/// - 章节顺序与原文位置一致，导入后不可变
/// - 阅读进度只在有效范围内保存
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    id: BookId,
    title: Title,
    chapters: Vec<Chapter>,
    position: PlaybackPosition,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_read_at: Option<DateTime<Utc>>,
}

impl Book {
    /// 从原始文本导入书籍并自动分章
    ///
    /// 内容（换行统一后去除首尾空白）少于 `min_chars` 个字符时拒绝导入，
    /// 不会进入分章器。
    pub fn import(title: Title, raw_text: &str, min_chars: usize) -> Result<Self, BookError> {
        let actual = raw_text.trim().chars().count();
        if actual < min_chars {
            return Err(BookError::ContentTooShort {
                actual,
                min: min_chars,
            });
        }

        let now = Utc::now();
        Ok(Self {
            id: BookId::new(),
            title,
            chapters: segment_chapters(raw_text),
            position: PlaybackPosition::start(),
            created_at: now,
            updated_at: now,
            last_read_at: None,
        })
    }

    /// 从持久化数据重建
    pub fn restore(
        id: BookId,
        title: Title,
        chapters: Vec<Chapter>,
        position: PlaybackPosition,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        last_read_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            title,
            chapters,
            position,
            created_at,
            updated_at,
            last_read_at,
        }
    }

    // Getters
    pub fn id(&self) -> &BookId {
        &self.id
    }

    pub fn title(&self) -> &Title {
        &self.title
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    pub fn chapter(&self, index: usize) -> Result<&Chapter, BookError> {
        self.chapters
            .get(index)
            .ok_or(BookError::ChapterNotFound(index))
    }

    pub fn position(&self) -> PlaybackPosition {
        self.position
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn last_read_at(&self) -> Option<DateTime<Utc>> {
        self.last_read_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_text() -> String {
        format!(
            "第一章 陨落的天才\n{}\n第二章 斗气大陆\n{}",
            "斗之力，三段！望着测验魔石碑上面闪亮得甚至有些刺眼的五个大字。",
            "少年面无表情，唇角有着一抹自嘲，紧握的手掌带来一阵阵钻心的疼痛。"
        )
    }

    #[test]
    fn test_import_segments_chapters() {
        let title = Title::new("斗破苍穹").unwrap();
        let book = Book::import(title, &sample_text(), DEFAULT_MIN_CONTENT_CHARS).unwrap();

        assert_eq!(book.chapter_count(), 2);
        assert_eq!(book.chapter(0).unwrap().title(), "第一章 陨落的天才");
        assert_eq!(book.position(), PlaybackPosition::start());
        assert!(book.last_read_at().is_none());
    }

    #[test]
    fn test_import_rejects_short_content() {
        let title = Title::new("短文").unwrap();
        let err = Book::import(title, "  太短了  ", DEFAULT_MIN_CONTENT_CHARS).unwrap_err();

        match err {
            BookError::ContentTooShort { actual, min } => {
                assert_eq!(actual, 3);
                assert_eq!(min, 50);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
