//! Book Queries

use uuid::Uuid;

/// 获取书籍详情查询（含章节目录与阅读进度）
#[derive(Debug, Clone)]
pub struct GetBook {
    pub book_id: Uuid,
}

/// 列出书库查询（最近阅读的在前）
#[derive(Debug, Clone)]
pub struct ListBooks;

/// 获取章节内容查询，按朗读单位切分
#[derive(Debug, Clone)]
pub struct GetChapter {
    pub book_id: Uuid,
    pub chapter_index: usize,
}
