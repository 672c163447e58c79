//! Session Commands - 会话与播放控制命令

use uuid::Uuid;

use crate::application::playback::PlaybackSnapshot;
use crate::domain::book::PlaybackPosition;

/// 打开听书会话命令 - 同一本书复用已有会话
#[derive(Debug, Clone)]
pub struct OpenSession {
    pub book_id: Uuid,
}

/// 打开会话响应
#[derive(Debug, Clone)]
pub struct OpenSessionResponse {
    pub session_id: String,
    /// 是否复用了已有会话
    pub reused: bool,
    pub snapshot: PlaybackSnapshot,
}

/// 播放控制动作
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackAction {
    Play,
    Stop,
    SkipForward,
    SkipBackward,
    SeekTo(PlaybackPosition),
    SetRate(f32),
}

/// 播放控制命令
#[derive(Debug, Clone)]
pub struct ControlPlayback {
    pub session_id: String,
    pub action: PlaybackAction,
}

/// 关闭会话命令
#[derive(Debug, Clone)]
pub struct CloseSession {
    pub session_id: String,
}
