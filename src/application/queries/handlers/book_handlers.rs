//! Book Query Handlers

use std::sync::Arc;
use uuid::Uuid;

use crate::application::error::ApplicationError;
use crate::application::ports::{BookRecord, BookRepositoryPort, ChapterRecord};
use crate::application::queries::{GetBook, GetChapter, ListBooks};
use crate::domain::book::PlaybackPosition;
use crate::domain::line_splitter::{LineSplitter, SplitConfig};

// ============================================================================
// Response DTOs
// ============================================================================

/// 书籍摘要响应
#[derive(Debug, Clone)]
pub struct BookSummaryResponse {
    pub id: Uuid,
    pub title: String,
    pub total_chapters: usize,
    pub position: PlaybackPosition,
    pub created_at: String,
    pub last_read_at: Option<String>,
}

impl From<BookRecord> for BookSummaryResponse {
    fn from(record: BookRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            total_chapters: record.total_chapters,
            position: record.position,
            created_at: record.created_at.to_rfc3339(),
            last_read_at: record.last_read_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// 目录条目
#[derive(Debug, Clone)]
pub struct ChapterEntry {
    pub index: usize,
    pub title: String,
    pub char_count: usize,
}

/// 书籍详情响应
#[derive(Debug, Clone)]
pub struct BookDetailResponse {
    pub summary: BookSummaryResponse,
    pub chapters: Vec<ChapterEntry>,
}

/// 章节内容响应
#[derive(Debug, Clone)]
pub struct ChapterResponse {
    pub book_id: Uuid,
    pub index: usize,
    pub title: String,
    pub char_count: usize,
    pub lines: Vec<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GetBook Handler
pub struct GetBookHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
}

impl GetBookHandler {
    pub fn new(book_repo: Arc<dyn BookRepositoryPort>) -> Self {
        Self { book_repo }
    }

    pub async fn handle(&self, query: GetBook) -> Result<BookDetailResponse, ApplicationError> {
        let book = self
            .book_repo
            .find_by_id(query.book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", query.book_id))?;

        let chapters = self
            .book_repo
            .find_chapters(query.book_id)
            .await?
            .into_iter()
            .map(|c: ChapterRecord| ChapterEntry {
                index: c.index,
                title: c.title,
                char_count: c.char_count,
            })
            .collect();

        Ok(BookDetailResponse {
            summary: BookSummaryResponse::from(book),
            chapters,
        })
    }
}

/// ListBooks Handler
pub struct ListBooksHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
}

impl ListBooksHandler {
    pub fn new(book_repo: Arc<dyn BookRepositoryPort>) -> Self {
        Self { book_repo }
    }

    pub async fn handle(&self, _query: ListBooks) -> Result<Vec<BookSummaryResponse>, ApplicationError> {
        let books = self.book_repo.find_all().await?;
        Ok(books.into_iter().map(BookSummaryResponse::from).collect())
    }
}

/// GetChapter Handler - 返回与播放时一致的朗读单位
pub struct GetChapterHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
    splitter: LineSplitter,
}

impl GetChapterHandler {
    pub fn new(book_repo: Arc<dyn BookRepositoryPort>, split_config: SplitConfig) -> Self {
        Self {
            book_repo,
            splitter: LineSplitter::new(split_config),
        }
    }

    pub async fn handle(&self, query: GetChapter) -> Result<ChapterResponse, ApplicationError> {
        let chapter = self
            .book_repo
            .find_chapter(query.book_id, query.chapter_index)
            .await?
            .ok_or_else(|| ApplicationError::NotFound {
                resource_type: "Chapter",
                id: format!("{}/{}", query.book_id, query.chapter_index),
            })?;

        Ok(ChapterResponse {
            book_id: chapter.book_id,
            index: chapter.index,
            lines: self.splitter.split(&chapter.content),
            title: chapter.title,
            char_count: chapter.char_count,
        })
    }
}
