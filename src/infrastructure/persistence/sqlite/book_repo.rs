//! SQLite Book Repository

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::DbPool;
use crate::application::ports::{BookRecord, BookRepositoryPort, ChapterRecord, RepositoryError};
use crate::domain::book::PlaybackPosition;

/// SQLite Book Repository
pub struct SqliteBookRepository {
    pool: DbPool,
}

impl SqliteBookRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// 统一的时间格式，保证按字符串排序与时间顺序一致
fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::DatabaseError(e.to_string())
}

#[derive(FromRow)]
struct BookRow {
    id: String,
    title: String,
    total_chapters: i64,
    chapter_index: i64,
    line_index: i64,
    created_at: String,
    updated_at: String,
    last_read_at: Option<String>,
}

impl TryFrom<BookRow> for BookRecord {
    type Error = RepositoryError;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        Ok(BookRecord {
            id: Uuid::parse_str(&row.id)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            title: row.title,
            total_chapters: row.total_chapters as usize,
            position: PlaybackPosition::new(row.chapter_index as usize, row.line_index as usize),
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            last_read_at: row.last_read_at.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

#[derive(FromRow)]
struct ChapterRow {
    book_id: String,
    chapter_index: i64,
    title: String,
    content: String,
    char_count: i64,
}

impl TryFrom<ChapterRow> for ChapterRecord {
    type Error = RepositoryError;

    fn try_from(row: ChapterRow) -> Result<Self, Self::Error> {
        Ok(ChapterRecord {
            book_id: Uuid::parse_str(&row.book_id)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            index: row.chapter_index as usize,
            title: row.title,
            content: row.content,
            char_count: row.char_count as usize,
        })
    }
}

const BOOK_COLUMNS: &str =
    "id, title, total_chapters, chapter_index, line_index, created_at, updated_at, last_read_at";

#[async_trait]
impl BookRepositoryPort for SqliteBookRepository {
    async fn save(&self, book: &BookRecord, chapters: &[ChapterRecord]) -> Result<(), RepositoryError> {
        // 书籍和章节在同一事务中写入
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query(
            r#"
            INSERT INTO books (id, title, total_chapters, chapter_index, line_index, created_at, updated_at, last_read_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                total_chapters = excluded.total_chapters,
                chapter_index = excluded.chapter_index,
                line_index = excluded.line_index,
                updated_at = excluded.updated_at,
                last_read_at = excluded.last_read_at
            "#,
        )
        .bind(book.id.to_string())
        .bind(&book.title)
        .bind(book.total_chapters as i64)
        .bind(book.position.chapter_index as i64)
        .bind(book.position.line_index as i64)
        .bind(format_timestamp(book.created_at))
        .bind(format_timestamp(book.updated_at))
        .bind(book.last_read_at.map(format_timestamp))
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        sqlx::query("DELETE FROM chapters WHERE book_id = ?")
            .bind(book.id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        for chapter in chapters {
            sqlx::query(
                r#"
                INSERT INTO chapters (book_id, chapter_index, title, content, char_count)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(chapter.book_id.to_string())
            .bind(chapter.index as i64)
            .bind(&chapter.title)
            .bind(&chapter.content)
            .bind(chapter.char_count as i64)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;

        tracing::debug!(book_id = %book.id, chapters = chapters.len(), "Book saved");
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<BookRecord>, RepositoryError> {
        let row: Option<BookRow> =
            sqlx::query_as(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        row.map(BookRecord::try_from).transpose()
    }

    async fn find_all(&self) -> Result<Vec<BookRecord>, RepositoryError> {
        let rows: Vec<BookRow> = sqlx::query_as(&format!(
            "SELECT {BOOK_COLUMNS} FROM books ORDER BY COALESCE(last_read_at, created_at) DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(BookRecord::try_from).collect()
    }

    async fn find_chapters(&self, book_id: Uuid) -> Result<Vec<ChapterRecord>, RepositoryError> {
        let rows: Vec<ChapterRow> = sqlx::query_as(
            "SELECT book_id, chapter_index, title, content, char_count FROM chapters WHERE book_id = ? ORDER BY chapter_index ASC",
        )
        .bind(book_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(ChapterRecord::try_from).collect()
    }

    async fn find_chapter(
        &self,
        book_id: Uuid,
        index: usize,
    ) -> Result<Option<ChapterRecord>, RepositoryError> {
        let row: Option<ChapterRow> = sqlx::query_as(
            "SELECT book_id, chapter_index, title, content, char_count FROM chapters WHERE book_id = ? AND chapter_index = ?",
        )
        .bind(book_id.to_string())
        .bind(index as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(ChapterRecord::try_from).transpose()
    }

    async fn update_progress(
        &self,
        id: Uuid,
        position: PlaybackPosition,
    ) -> Result<(), RepositoryError> {
        let now = format_timestamp(Utc::now());
        let result = sqlx::query(
            "UPDATE books SET chapter_index = ?, line_index = ?, updated_at = ?, last_read_at = ? WHERE id = ?",
        )
        .bind(position.chapter_index as i64)
        .bind(position.line_index as i64)
        .bind(&now)
        .bind(&now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query("DELETE FROM chapters WHERE book_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }

        tx.commit().await.map_err(db_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::sqlite::{create_pool, run_migrations, DatabaseConfig};
    use chrono::Duration;

    async fn repo() -> SqliteBookRepository {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteBookRepository::new(pool)
    }

    fn book(title: &str, created_at: DateTime<Utc>) -> (BookRecord, Vec<ChapterRecord>) {
        let id = Uuid::new_v4();
        let chapters = vec![
            ChapterRecord {
                book_id: id,
                index: 0,
                title: "第一章 开端".to_string(),
                content: "第一章 开端\n天色已晚。".to_string(),
                char_count: 11,
            },
            ChapterRecord {
                book_id: id,
                index: 1,
                title: "第二章 转折".to_string(),
                content: "第二章 转折\n风停了。".to_string(),
                char_count: 10,
            },
        ];
        let record = BookRecord {
            id,
            title: title.to_string(),
            total_chapters: chapters.len(),
            position: PlaybackPosition::start(),
            created_at,
            updated_at: created_at,
            last_read_at: None,
        };
        (record, chapters)
    }

    #[tokio::test]
    async fn test_save_and_load_book() {
        let repo = repo().await;
        let (record, chapters) = book("测试", Utc::now());
        repo.save(&record, &chapters).await.unwrap();

        let found = repo.find_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(found.title, "测试");
        assert_eq!(found.total_chapters, 2);
        assert!(found.last_read_at.is_none());

        let loaded = repo.find_chapters(record.id).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].title, "第二章 转折");

        let chapter = repo.find_chapter(record.id, 0).await.unwrap().unwrap();
        assert_eq!(chapter.content, "第一章 开端\n天色已晚。");
        assert!(repo.find_chapter(record.id, 5).await.unwrap().is_none());
        assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_progress_is_last_writer_wins() {
        let repo = repo().await;
        let (record, chapters) = book("测试", Utc::now());
        repo.save(&record, &chapters).await.unwrap();

        repo.update_progress(record.id, PlaybackPosition::new(0, 3)).await.unwrap();
        repo.update_progress(record.id, PlaybackPosition::new(1, 1)).await.unwrap();

        let found = repo.find_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(found.position, PlaybackPosition::new(1, 1));
        assert!(found.last_read_at.is_some());

        assert!(matches!(
            repo.update_progress(Uuid::new_v4(), PlaybackPosition::start()).await,
            Err(RepositoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_find_all_orders_by_recent_reading() {
        let repo = repo().await;
        let now = Utc::now();
        let (old, old_chapters) = book("旧书", now - Duration::days(2));
        let (new, new_chapters) = book("新书", now - Duration::days(1));
        repo.save(&old, &old_chapters).await.unwrap();
        repo.save(&new, &new_chapters).await.unwrap();

        let titles: Vec<String> = repo.find_all().await.unwrap().into_iter().map(|b| b.title).collect();
        assert_eq!(titles, vec!["新书", "旧书"]);

        // 读过的旧书排到前面
        repo.update_progress(old.id, PlaybackPosition::new(0, 1)).await.unwrap();
        let titles: Vec<String> = repo.find_all().await.unwrap().into_iter().map(|b| b.title).collect();
        assert_eq!(titles, vec!["旧书", "新书"]);
    }

    #[tokio::test]
    async fn test_delete_removes_chapters() {
        let repo = repo().await;
        let (record, chapters) = book("测试", Utc::now());
        repo.save(&record, &chapters).await.unwrap();

        repo.delete(record.id).await.unwrap();

        assert!(repo.find_by_id(record.id).await.unwrap().is_none());
        assert!(repo.find_chapters(record.id).await.unwrap().is_empty());
        assert!(matches!(
            repo.delete(record.id).await,
            Err(RepositoryError::NotFound(_))
        ));
    }
}
