//! Book Context - Value Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 书籍唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookId(Uuid);

impl BookId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 书名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Title(String);

impl Title {
    pub const MAX_LEN: usize = 200;

    pub fn new(title: impl Into<String>) -> Result<Self, &'static str> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err("标题不能为空");
        }
        if title.len() > Self::MAX_LEN {
            return Err("标题长度不能超过200字节");
        }
        Ok(Self(title))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Title {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 播放位置（章节索引 + 行索引）
///
/// 持久化的最小单位。自动播放时在章节内单调递增，
/// 用户跳转/跳句时可任意变化。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaybackPosition {
    pub chapter_index: usize,
    pub line_index: usize,
}

impl PlaybackPosition {
    pub fn new(chapter_index: usize, line_index: usize) -> Self {
        Self {
            chapter_index,
            line_index,
        }
    }

    /// 书籍开头
    pub fn start() -> Self {
        Self::default()
    }
}

impl std::fmt::Display for PlaybackPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.chapter_index, self.line_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_is_trimmed() {
        let title = Title::new("  斗破苍穹 ").unwrap();
        assert_eq!(title.as_str(), "斗破苍穹");
    }

    #[test]
    fn test_title_rejects_blank_and_oversized() {
        assert!(Title::new("   ").is_err());
        assert!(Title::new("书".repeat(100)).is_err());
    }

    #[test]
    fn test_position_ordering_fields() {
        let pos = PlaybackPosition::new(2, 5);
        assert_eq!(pos.to_string(), "2:5");
        assert_eq!(PlaybackPosition::start(), PlaybackPosition::new(0, 0));
    }
}
