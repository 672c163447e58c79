//! Repository Ports - 出站端口
//!
//! 定义书籍持久化的抽象接口
//! 具体实现在 infrastructure 层（SQLite）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::book::{Book, BookId, Chapter, PlaybackPosition, Title};

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// 书籍实体（用于持久化）
#[derive(Debug, Clone)]
pub struct BookRecord {
    pub id: Uuid,
    pub title: String,
    pub total_chapters: usize,
    pub position: PlaybackPosition,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_read_at: Option<DateTime<Utc>>,
}

impl From<&Book> for BookRecord {
    fn from(book: &Book) -> Self {
        Self {
            id: *book.id().as_uuid(),
            title: book.title().as_str().to_string(),
            total_chapters: book.chapter_count(),
            position: book.position(),
            created_at: book.created_at(),
            updated_at: book.updated_at(),
            last_read_at: book.last_read_at(),
        }
    }
}

impl BookRecord {
    /// 与章节一起重建 Book 聚合
    pub fn into_book(self, chapters: Vec<ChapterRecord>) -> Result<Book, RepositoryError> {
        let title = Title::new(self.title)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        let chapters = chapters.into_iter().map(Chapter::from).collect();

        Ok(Book::restore(
            BookId::from_uuid(self.id),
            title,
            chapters,
            self.position,
            self.created_at,
            self.updated_at,
            self.last_read_at,
        ))
    }
}

/// 章节实体（用于持久化）
#[derive(Debug, Clone)]
pub struct ChapterRecord {
    pub book_id: Uuid,
    pub index: usize,
    pub title: String,
    pub content: String,
    pub char_count: usize,
}

impl ChapterRecord {
    pub fn from_chapter(book_id: Uuid, chapter: &Chapter) -> Self {
        Self {
            book_id,
            index: chapter.index(),
            title: chapter.title().to_string(),
            content: chapter.content().to_string(),
            char_count: chapter.char_count(),
        }
    }
}

impl From<ChapterRecord> for Chapter {
    fn from(record: ChapterRecord) -> Self {
        Chapter::new(record.index, record.title, record.content)
    }
}

/// Book Repository Port
#[async_trait]
pub trait BookRepositoryPort: Send + Sync {
    /// 保存书籍及其全部章节
    async fn save(&self, book: &BookRecord, chapters: &[ChapterRecord]) -> Result<(), RepositoryError>;

    /// 根据 ID 查找书籍
    async fn find_by_id(&self, id: Uuid) -> Result<Option<BookRecord>, RepositoryError>;

    /// 获取所有书籍（最近阅读的在前）
    async fn find_all(&self) -> Result<Vec<BookRecord>, RepositoryError>;

    /// 获取书籍的所有章节（按索引排序）
    async fn find_chapters(&self, book_id: Uuid) -> Result<Vec<ChapterRecord>, RepositoryError>;

    /// 获取指定章节
    async fn find_chapter(
        &self,
        book_id: Uuid,
        index: usize,
    ) -> Result<Option<ChapterRecord>, RepositoryError>;

    /// 更新阅读进度和最近阅读时间
    async fn update_progress(
        &self,
        id: Uuid,
        position: PlaybackPosition,
    ) -> Result<(), RepositoryError>;

    /// 删除书籍及其章节
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}
