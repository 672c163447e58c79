//! Speech Engine Port - 语音合成引擎抽象
//!
//! 引擎是单槽位的：同一时刻只朗读一条。`speak` 立即返回，
//! 朗读结束后通过 [`UtteranceCallback`] 回报且仅回报一次结果。

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::playback::{Generation, UtteranceOutcome};

/// 语音引擎错误
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Failed to start speech engine: {0}")]
    SpawnFailed(String),

    #[error("Speech engine exited abnormally: {0}")]
    AbnormalExit(String),

    #[error("Speech engine unavailable: {0}")]
    Unavailable(String),
}

/// 朗读参数
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechOptions {
    /// 语言标签，如 zh-CN
    pub language_tag: String,
    /// 语速倍率，1.0 为正常速度
    pub rate: f32,
    /// 音高倍率，1.0 为正常音高
    pub pitch: f32,
}

impl Default for SpeechOptions {
    fn default() -> Self {
        Self {
            language_tag: "zh-CN".to_string(),
            rate: 0.9,
            pitch: 1.0,
        }
    }
}

/// 带代际标记的朗读结果
#[derive(Debug, Clone, PartialEq)]
pub struct UtteranceCompletion {
    pub generation: Generation,
    pub outcome: UtteranceOutcome,
}

/// 朗读完成回调
///
/// `resolve` 消耗自身，因此一条朗读至多回报一次；
/// 未回报就被丢弃时按 `Stopped` 回报。
#[derive(Debug)]
pub struct UtteranceCallback {
    generation: Generation,
    sender: Option<mpsc::UnboundedSender<UtteranceCompletion>>,
}

impl UtteranceCallback {
    pub fn new(generation: Generation, sender: mpsc::UnboundedSender<UtteranceCompletion>) -> Self {
        Self {
            generation,
            sender: Some(sender),
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// 回报朗读结果
    pub fn resolve(mut self, outcome: UtteranceOutcome) {
        self.send(outcome);
    }

    /// 回报引擎调用结果，错误转换为 `UtteranceOutcome::Error`
    pub fn resolve_with(self, result: Result<UtteranceOutcome, SpeechError>) {
        match result {
            Ok(outcome) => self.resolve(outcome),
            Err(e) => self.resolve(UtteranceOutcome::Error(e.to_string())),
        }
    }

    fn send(&mut self, outcome: UtteranceOutcome) {
        if let Some(sender) = self.sender.take() {
            // 接收端已关闭说明会话已结束，结果无人关心
            let _ = sender.send(UtteranceCompletion {
                generation: self.generation,
                outcome,
            });
        }
    }
}

impl Drop for UtteranceCallback {
    fn drop(&mut self) {
        self.send(UtteranceOutcome::Stopped);
    }
}

/// Speech Engine Port
///
/// 由 PlaybackController 独占，其它组件不得直接调用
pub trait SpeechEnginePort: Send + Sync {
    /// 调度一条朗读，新的朗读会顶替仍在进行的旧朗读
    fn speak(&self, text: &str, options: &SpeechOptions, callback: UtteranceCallback);

    /// 取消当前及排队中的朗读（幂等，没有朗读时也可调用）
    fn stop(&self);

    /// 引擎名称（用于日志）
    fn name(&self) -> &'static str;
}

/// Speech Engine Factory
///
/// 每个会话向工厂领取自己的引擎实例，会话之间的 `stop` 互不影响
pub trait SpeechEngineFactory: Send + Sync {
    fn create(&self) -> Arc<dyn SpeechEnginePort>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_resolves_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let generation = Generation::default().next();
        let callback = UtteranceCallback::new(generation, tx);

        callback.resolve(UtteranceOutcome::Done);

        let completion = rx.try_recv().unwrap();
        assert_eq!(completion.generation, generation);
        assert_eq!(completion.outcome, UtteranceOutcome::Done);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_callback_reports_stopped() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        drop(UtteranceCallback::new(Generation::default(), tx));

        assert_eq!(rx.try_recv().unwrap().outcome, UtteranceOutcome::Stopped);
    }

    #[test]
    fn test_resolve_with_error() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let callback = UtteranceCallback::new(Generation::default(), tx);

        callback.resolve_with(Err(SpeechError::SpawnFailed("espeak-ng not found".into())));

        match rx.try_recv().unwrap().outcome {
            UtteranceOutcome::Error(cause) => assert!(cause.contains("espeak-ng")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
