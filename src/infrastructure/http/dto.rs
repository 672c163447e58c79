//! Data Transfer Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::{
    BookDetailResponse, BookSummaryResponse, ChapterEntry, ChapterResponse, ImportBookResponse,
    PlaybackSnapshot,
};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Book DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ImportBookRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct BookIdRequest {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct GetChapterRequest {
    pub book_id: Uuid,
    #[serde(alias = "chapter_index")]
    pub index: usize,
}

#[derive(Debug, Serialize)]
pub struct ImportBookResponseDto {
    pub id: Uuid,
    pub title: String,
    pub total_chapters: usize,
    pub chapter_titles: Vec<String>,
}

impl From<ImportBookResponse> for ImportBookResponseDto {
    fn from(r: ImportBookResponse) -> Self {
        Self {
            id: r.id,
            title: r.title,
            total_chapters: r.total_chapters,
            chapter_titles: r.chapter_titles,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookSummaryDto {
    pub id: Uuid,
    pub title: String,
    pub total_chapters: usize,
    pub chapter_index: usize,
    pub line_index: usize,
    pub created_at: String,
    pub last_read_at: Option<String>,
}

impl From<BookSummaryResponse> for BookSummaryDto {
    fn from(r: BookSummaryResponse) -> Self {
        Self {
            id: r.id,
            title: r.title,
            total_chapters: r.total_chapters,
            chapter_index: r.position.chapter_index,
            line_index: r.position.line_index,
            created_at: r.created_at,
            last_read_at: r.last_read_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChapterEntryDto {
    pub index: usize,
    pub title: String,
    pub char_count: usize,
}

impl From<ChapterEntry> for ChapterEntryDto {
    fn from(c: ChapterEntry) -> Self {
        Self {
            index: c.index,
            title: c.title,
            char_count: c.char_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookDetailDto {
    #[serde(flatten)]
    pub summary: BookSummaryDto,
    pub chapters: Vec<ChapterEntryDto>,
}

impl From<BookDetailResponse> for BookDetailDto {
    fn from(r: BookDetailResponse) -> Self {
        Self {
            summary: r.summary.into(),
            chapters: r.chapters.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChapterDto {
    pub book_id: Uuid,
    pub index: usize,
    pub title: String,
    pub char_count: usize,
    pub total_lines: usize,
    pub lines: Vec<String>,
}

impl From<ChapterResponse> for ChapterDto {
    fn from(r: ChapterResponse) -> Self {
        Self {
            book_id: r.book_id,
            index: r.index,
            title: r.title,
            char_count: r.char_count,
            total_lines: r.lines.len(),
            lines: r.lines,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteBookResponseDto {
    pub id: Uuid,
}

// ============================================================================
// Session DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct OpenSessionRequest {
    pub book_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    pub session_id: String,
    pub chapter_index: usize,
    #[serde(default)]
    pub line_index: usize,
}

#[derive(Debug, Deserialize)]
pub struct SetRateRequest {
    pub session_id: String,
    pub rate: f32,
}

#[derive(Debug, Serialize)]
pub struct OpenSessionResponseDto {
    pub session_id: String,
    pub reused: bool,
    pub status: PlaybackSnapshot,
}

#[derive(Debug, Serialize)]
pub struct CloseSessionResponseDto {
    pub session_id: String,
    pub status: Option<PlaybackSnapshot>,
}
