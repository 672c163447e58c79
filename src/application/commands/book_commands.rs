//! Book Commands

use uuid::Uuid;

/// 导入书籍命令（原始文本，自动分章）
#[derive(Debug, Clone)]
pub struct ImportBook {
    pub title: String,
    pub text: String,
}

/// 删除书籍命令
#[derive(Debug, Clone)]
pub struct DeleteBook {
    pub book_id: Uuid,
}
