//! Playback - 状态与代际标记

use serde::{Deserialize, Serialize};

use crate::domain::book::PlaybackPosition;

/// 播放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// 没有进行中的朗读，也不在尝试播放
    Idle,
    /// 有一条朗读在进行中，自动前进已就绪
    Speaking,
    /// 用户显式停止，直到再次 Play
    Stopped,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Speaking => "speaking",
            PlaybackState::Stopped => "stopped",
        }
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        PlaybackState::Idle
    }
}

/// 代际标记
///
/// 每次 Play / Stop 都会生成新的代际；引擎回调只有在代际与当前一致时才生效。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// 一次朗读的结束方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceOutcome {
    /// 正常读完
    Done,
    /// 被 stop 打断
    Stopped,
    /// 引擎出错
    Error(String),
}

/// 一次朗读请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub generation: Generation,
    pub position: PlaybackPosition,
    pub text: String,
}
