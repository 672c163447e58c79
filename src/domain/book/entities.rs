//! Book Context - Entities

use serde::{Deserialize, Serialize};

/// 章节
///
/// 不变量:
/// - index 在书内从 0 开始连续编号，仅由在原文中的位置决定
/// - 分章器产出后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    index: usize,
    title: String,
    content: String,
}

impl Chapter {
    pub fn new(index: usize, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            index,
            title: title.into(),
            content: content.into(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}
