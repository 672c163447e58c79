//! Book Command Handlers

use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{DeleteBook, ImportBook};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    BookRecord, BookRepositoryPort, ChapterRecord, EventSinkPort, ReaderEvent, SessionManagerPort,
};
use crate::domain::book::{Book, Title};

/// 导入书籍响应
#[derive(Debug, Clone)]
pub struct ImportBookResponse {
    pub id: Uuid,
    pub title: String,
    pub total_chapters: usize,
    pub chapter_titles: Vec<String>,
}

/// ImportBook Handler - 校验、分章并保存
pub struct ImportBookHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
    events: Arc<dyn EventSinkPort>,
    min_content_chars: usize,
}

impl ImportBookHandler {
    pub fn new(
        book_repo: Arc<dyn BookRepositoryPort>,
        events: Arc<dyn EventSinkPort>,
        min_content_chars: usize,
    ) -> Self {
        Self {
            book_repo,
            events,
            min_content_chars,
        }
    }

    pub async fn handle(&self, command: ImportBook) -> Result<ImportBookResponse, ApplicationError> {
        let title = Title::new(command.title).map_err(ApplicationError::validation)?;
        let book = Book::import(title, &command.text, self.min_content_chars)?;
        let book_id = *book.id().as_uuid();

        let record = BookRecord::from(&book);
        let chapters: Vec<ChapterRecord> = book
            .chapters()
            .iter()
            .map(|chapter| ChapterRecord::from_chapter(book_id, chapter))
            .collect();
        self.book_repo.save(&record, &chapters).await?;

        tracing::info!(
            book_id = %book_id,
            title = %record.title,
            total_chapters = record.total_chapters,
            "Book imported"
        );

        self.events.publish_global(ReaderEvent::BookImported {
            book_id,
            title: record.title.clone(),
            total_chapters: record.total_chapters,
        });

        Ok(ImportBookResponse {
            id: book_id,
            title: record.title,
            total_chapters: record.total_chapters,
            chapter_titles: chapters.into_iter().map(|c| c.title).collect(),
        })
    }
}

/// DeleteBook Handler - 先关闭该书的会话，再删除
pub struct DeleteBookHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
    session_manager: Arc<dyn SessionManagerPort>,
    events: Arc<dyn EventSinkPort>,
}

impl DeleteBookHandler {
    pub fn new(
        book_repo: Arc<dyn BookRepositoryPort>,
        session_manager: Arc<dyn SessionManagerPort>,
        events: Arc<dyn EventSinkPort>,
    ) -> Self {
        Self {
            book_repo,
            session_manager,
            events,
        }
    }

    pub async fn handle(&self, command: DeleteBook) -> Result<(), ApplicationError> {
        let book_id = command.book_id;

        self.book_repo
            .find_by_id(book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", book_id))?;

        // 关闭会话，避免控制器在删除后还写入进度
        if let Some(session) = self.session_manager.find_by_book(book_id) {
            if let Ok(session) = self.session_manager.remove(&session.id) {
                if let Err(e) = session.handle.close().await {
                    tracing::debug!(session_id = %session.id, error = %e, "Session already closed");
                }
            }
        }

        self.book_repo.delete(book_id).await?;

        tracing::info!(book_id = %book_id, "Book deleted");
        self.events
            .publish_global(ReaderEvent::BookDeleted { book_id });

        Ok(())
    }
}
