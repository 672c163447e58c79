//! Playback - 顺序朗读
//!
//! 管理一本书的朗读状态：当前位置、播放状态以及用于作废过期回调的代际标记

mod machine;
mod state;

pub use machine::{PlaybackEffect, PlaybackMachine};
pub use state::{Generation, PlaybackState, Utterance, UtteranceOutcome};
