//! Playback - 朗读控制
//!
//! 每个会话一个控制器 actor，通过 [`PlaybackHandle`] 发送命令

mod controller;

pub use controller::{
    PlaybackController, PlaybackError, PlaybackHandle, PlaybackSetup, PlaybackSnapshot, MAX_RATE,
    MIN_RATE,
};
