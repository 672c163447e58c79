//! Fake Speech Engine - 不发声的语音引擎
//!
//! 按字数和语速计算朗读时长，到时回报 Done，用于开发环境和测试

use std::sync::Arc;
use std::time::Duration;

use super::UtteranceSlot;
use crate::application::ports::{
    SpeechEngineFactory, SpeechEnginePort, SpeechOptions, UtteranceCallback,
};
use crate::domain::playback::UtteranceOutcome;

/// Fake Speech Engine 配置
#[derive(Debug, Clone)]
pub struct FakeSpeechEngineConfig {
    /// 1.0 倍速下每秒朗读的字数
    pub chars_per_sec: f32,
}

impl Default for FakeSpeechEngineConfig {
    fn default() -> Self {
        Self { chars_per_sec: 5.0 }
    }
}

/// Fake Speech Engine
pub struct FakeSpeechEngine {
    config: FakeSpeechEngineConfig,
    slot: Arc<UtteranceSlot>,
}

impl FakeSpeechEngine {
    pub fn new(config: FakeSpeechEngineConfig) -> Self {
        tracing::debug!(
            chars_per_sec = config.chars_per_sec,
            "FakeSpeechEngine created"
        );
        Self {
            config,
            slot: Arc::new(UtteranceSlot::default()),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeSpeechEngineConfig::default())
    }

    /// 模拟的朗读时长
    fn duration_for(&self, text: &str, options: &SpeechOptions) -> Duration {
        let speed = (self.config.chars_per_sec * options.rate).max(f32::EPSILON);
        Duration::from_secs_f32(text.chars().count() as f32 / speed)
    }
}

impl SpeechEnginePort for FakeSpeechEngine {
    fn speak(&self, text: &str, options: &SpeechOptions, callback: UtteranceCallback) {
        let cancel = self.slot.occupy();
        let duration = self.duration_for(text, options);

        tracing::debug!(
            generation = %callback.generation(),
            duration_ms = duration.as_millis() as u64,
            "FakeSpeechEngine: simulating utterance"
        );

        tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = tokio::time::sleep(duration) => UtteranceOutcome::Done,
                _ = cancel => UtteranceOutcome::Stopped,
            };
            callback.resolve(outcome);
        });
    }

    fn stop(&self) {
        self.slot.cancel();
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// 为每个会话创建独立的 FakeSpeechEngine
#[derive(Debug, Clone, Default)]
pub struct FakeSpeechEngineFactory {
    config: FakeSpeechEngineConfig,
}

impl FakeSpeechEngineFactory {
    pub fn new(config: FakeSpeechEngineConfig) -> Self {
        tracing::info!(chars_per_sec = config.chars_per_sec, "Using fake speech engine");
        Self { config }
    }
}

impl SpeechEngineFactory for FakeSpeechEngineFactory {
    fn create(&self) -> Arc<dyn SpeechEnginePort> {
        Arc::new(FakeSpeechEngine::new(self.config.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::playback::Generation;
    use tokio::sync::mpsc;

    fn options(rate: f32) -> SpeechOptions {
        SpeechOptions {
            rate,
            ..Default::default()
        }
    }

    #[test]
    fn test_duration_scales_with_rate() {
        let engine = FakeSpeechEngine::new(FakeSpeechEngineConfig { chars_per_sec: 10.0 });

        assert_eq!(engine.duration_for("一二三四五六七八九十", &options(1.0)), Duration::from_secs(1));
        assert_eq!(engine.duration_for("一二三四五六七八九十", &options(2.0)), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_utterance_completes() {
        let engine = FakeSpeechEngine::with_defaults();
        let (tx, mut rx) = mpsc::unbounded_channel();

        engine.speak("你好", &options(1.0), UtteranceCallback::new(Generation::default(), tx));

        assert_eq!(rx.recv().await.unwrap().outcome, UtteranceOutcome::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_utterance_replaces_old() {
        let engine = FakeSpeechEngine::with_defaults();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let first = Generation::default();
        let second = first.next();

        engine.speak("很长很长的一句话", &options(1.0), UtteranceCallback::new(first, tx.clone()));
        engine.speak("短", &options(1.0), UtteranceCallback::new(second, tx));

        let a = rx.recv().await.unwrap();
        let b = rx.recv().await.unwrap();
        assert_eq!((a.generation, a.outcome), (first, UtteranceOutcome::Stopped));
        assert_eq!((b.generation, b.outcome), (second, UtteranceOutcome::Done));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_reports_stopped() {
        let engine = FakeSpeechEngine::with_defaults();
        let (tx, mut rx) = mpsc::unbounded_channel();

        engine.speak("你好", &options(1.0), UtteranceCallback::new(Generation::default(), tx));
        engine.stop();

        assert_eq!(rx.recv().await.unwrap().outcome, UtteranceOutcome::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_engines_from_factory_do_not_share_slot() {
        let factory = FakeSpeechEngineFactory::default();
        let reader = factory.create();
        let other = factory.create();
        let (tx, mut rx) = mpsc::unbounded_channel();

        reader.speak("你好", &options(1.0), UtteranceCallback::new(Generation::default(), tx));
        other.stop();

        assert_eq!(rx.recv().await.unwrap().outcome, UtteranceOutcome::Done);
    }
}
