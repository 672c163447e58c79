//! Book HTTP Handlers

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::path::PathBuf;
use std::sync::Arc;

use crate::application::{DeleteBook, GetBook, GetChapter, ImportBook, ListBooks};
use crate::infrastructure::http::dto::{
    ApiResponse, BookDetailDto, BookIdRequest, BookSummaryDto, ChapterDto, DeleteBookResponseDto,
    GetChapterRequest, ImportBookRequest, ImportBookResponseDto,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 上传 TXT 文件导入书籍
///
/// 字段：`file`（必填）、`title`（可选，默认取文件名）
pub async fn upload_book(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ImportBookResponseDto>>, ApiError> {
    let mut title: Option<String> = None;
    let mut content: Option<String> = None;
    let mut filename: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "title" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read title: {}", e)))?;
                if !text.trim().is_empty() {
                    title = Some(text);
                }
            }
            "file" => {
                filename = field.file_name().map(|s| s.to_string());

                let content_type = field.content_type().unwrap_or("application/octet-stream");
                let is_txt = filename
                    .as_ref()
                    .map(|f| f.to_lowercase().ends_with(".txt"))
                    .unwrap_or(false);
                if !is_txt && !content_type.contains("text") {
                    return Err(ApiError::BadRequest(
                        "Only TXT files are allowed".to_string(),
                    ));
                }

                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;

                if bytes.len() as u64 > state.max_upload_size {
                    return Err(ApiError::BadRequest(format!(
                        "File too large. Maximum size is {} MB",
                        state.max_upload_size / 1024 / 1024
                    )));
                }

                content = Some(
                    String::from_utf8(bytes.to_vec())
                        .map_err(|_| ApiError::BadRequest("File must be valid UTF-8 text".to_string()))?,
                );
            }
            _ => {}
        }
    }

    let content = content.ok_or_else(|| ApiError::BadRequest("File is required".to_string()))?;

    let title = title.unwrap_or_else(|| {
        filename
            .as_ref()
            .and_then(|f| {
                PathBuf::from(f)
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(|s| s.to_string())
            })
            .unwrap_or_else(|| "Untitled".to_string())
    });

    let result = state
        .import_book_handler
        .handle(ImportBook {
            title,
            text: content,
        })
        .await?;

    Ok(Json(ApiResponse::success(result.into())))
}

/// 以 JSON 正文导入书籍
pub async fn import_book(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImportBookRequest>,
) -> Result<Json<ApiResponse<ImportBookResponseDto>>, ApiError> {
    let result = state
        .import_book_handler
        .handle(ImportBook {
            title: req.title,
            text: req.content,
        })
        .await?;

    Ok(Json(ApiResponse::success(result.into())))
}

/// 书架：按最近阅读排序
pub async fn list_books(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<BookSummaryDto>>>, ApiError> {
    let books = state.list_books_handler.handle(ListBooks).await?;
    Ok(Json(ApiResponse::success(
        books.into_iter().map(Into::into).collect(),
    )))
}

/// 书籍详情与目录
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BookIdRequest>,
) -> Result<Json<ApiResponse<BookDetailDto>>, ApiError> {
    let detail = state
        .get_book_handler
        .handle(GetBook { book_id: req.id })
        .await?;
    Ok(Json(ApiResponse::success(detail.into())))
}

/// 章节正文（按朗读单位切分）
pub async fn get_chapter(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GetChapterRequest>,
) -> Result<Json<ApiResponse<ChapterDto>>, ApiError> {
    let chapter = state
        .get_chapter_handler
        .handle(GetChapter {
            book_id: req.book_id,
            chapter_index: req.index,
        })
        .await?;
    Ok(Json(ApiResponse::success(chapter.into())))
}

/// 删除书籍，正在朗读的会话一并关闭
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BookIdRequest>,
) -> Result<Json<ApiResponse<DeleteBookResponseDto>>, ApiError> {
    state
        .delete_book_handler
        .handle(DeleteBook { book_id: req.id })
        .await?;
    Ok(Json(ApiResponse::success(DeleteBookResponseDto { id: req.id })))
}
