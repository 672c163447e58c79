//! Progress Writer - 阅读进度的后台写入
//!
//! 控制器只负责投递，写入在单个后台任务中按投递顺序执行，
//! 因此同一本书最后投递的位置就是最终保存的位置。

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::application::ports::{BookRepositoryPort, ProgressTrackerPort, RepositoryError};
use crate::domain::book::PlaybackPosition;

enum ProgressMessage {
    Update {
        book_id: Uuid,
        position: PlaybackPosition,
    },
    Flush(oneshot::Sender<()>),
}

/// 进度写入端（实现 ProgressTrackerPort）
#[derive(Clone)]
pub struct ProgressWriter {
    sender: mpsc::UnboundedSender<ProgressMessage>,
}

impl ProgressWriter {
    /// 创建写入端和对应的后台 Worker
    pub fn new(book_repo: Arc<dyn BookRepositoryPort>) -> (Self, ProgressWriterWorker) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self { sender },
            ProgressWriterWorker {
                receiver,
                book_repo,
            },
        )
    }

    /// 等待此前投递的所有写入完成
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.sender.send(ProgressMessage::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }
}

impl ProgressTrackerPort for ProgressWriter {
    fn persist(&self, book_id: Uuid, position: PlaybackPosition) {
        if self
            .sender
            .send(ProgressMessage::Update { book_id, position })
            .is_err()
        {
            tracing::warn!(book_id = %book_id, position = %position, "Progress writer stopped, update dropped");
        }
    }
}

/// 进度写入 Worker
pub struct ProgressWriterWorker {
    receiver: mpsc::UnboundedReceiver<ProgressMessage>,
    book_repo: Arc<dyn BookRepositoryPort>,
}

impl ProgressWriterWorker {
    /// 启动 Worker，所有写入端被丢弃后退出
    pub async fn run(mut self) {
        tracing::info!("ProgressWriter started");

        while let Some(message) = self.receiver.recv().await {
            match message {
                ProgressMessage::Update { book_id, position } => {
                    match self.book_repo.update_progress(book_id, position).await {
                        Ok(()) => {
                            tracing::debug!(book_id = %book_id, position = %position, "Progress saved");
                        }
                        // 书已被删除
                        Err(RepositoryError::NotFound(_)) => {
                            tracing::debug!(book_id = %book_id, "Progress for missing book ignored");
                        }
                        Err(e) => {
                            tracing::error!(book_id = %book_id, position = %position, error = %e, "Failed to save progress");
                        }
                    }
                }
                ProgressMessage::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }

        tracing::info!("ProgressWriter stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{BookRecord, ChapterRecord};
    use crate::infrastructure::persistence::sqlite::{
        create_pool, run_migrations, DatabaseConfig, SqliteBookRepository,
    };
    use chrono::Utc;

    async fn setup() -> (Arc<SqliteBookRepository>, Uuid) {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let repo = Arc::new(SqliteBookRepository::new(pool));

        let id = Uuid::new_v4();
        let now = Utc::now();
        let record = BookRecord {
            id,
            title: "测试".to_string(),
            total_chapters: 1,
            position: PlaybackPosition::start(),
            created_at: now,
            updated_at: now,
            last_read_at: None,
        };
        let chapter = ChapterRecord {
            book_id: id,
            index: 0,
            title: "正文".to_string(),
            content: "一\n二\n三".to_string(),
            char_count: 5,
        };
        repo.save(&record, &[chapter]).await.unwrap();
        (repo, id)
    }

    #[tokio::test]
    async fn test_last_update_wins() {
        let (repo, id) = setup().await;
        let (writer, worker) = ProgressWriter::new(repo.clone());
        tokio::spawn(worker.run());

        writer.persist(id, PlaybackPosition::new(0, 1));
        writer.persist(id, PlaybackPosition::new(0, 2));
        writer.flush().await;

        let book = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(book.position, PlaybackPosition::new(0, 2));
    }

    #[tokio::test]
    async fn test_missing_book_does_not_stop_worker() {
        let (repo, id) = setup().await;
        let (writer, worker) = ProgressWriter::new(repo.clone());
        tokio::spawn(worker.run());

        writer.persist(Uuid::new_v4(), PlaybackPosition::new(0, 1));
        writer.persist(id, PlaybackPosition::new(0, 1));
        writer.flush().await;

        let book = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(book.position, PlaybackPosition::new(0, 1));
    }
}
