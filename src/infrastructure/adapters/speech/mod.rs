//! Speech Adapter - 语音合成引擎实现
//!
//! - command: 调用本地 espeak-ng 之类的命令行引擎
//! - fake: 按字数计时的假引擎，用于开发和测试

mod command_speech_engine;
mod fake_speech_engine;

use std::sync::Mutex;
use tokio::sync::oneshot;

pub use command_speech_engine::{
    CommandSpeechEngine, CommandSpeechEngineConfig, CommandSpeechEngineFactory,
};
pub use fake_speech_engine::{FakeSpeechEngine, FakeSpeechEngineConfig, FakeSpeechEngineFactory};

/// 单槽位：保存当前朗读的取消信号
///
/// 放入新朗读时取消旧朗读，保证同一时刻只有一条在进行。
/// 每个引擎实例一个槽位，只属于一个会话
#[derive(Debug, Default)]
pub(crate) struct UtteranceSlot {
    current: Mutex<Option<oneshot::Sender<()>>>,
}

impl UtteranceSlot {
    /// 取消旧朗读并占用槽位，返回新朗读的取消接收端
    pub(crate) fn occupy(&self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        let previous = self.lock().replace(tx);
        if let Some(previous) = previous {
            let _ = previous.send(());
        }
        rx
    }

    /// 取消当前朗读（没有朗读时什么都不做）
    pub(crate) fn cancel(&self) -> bool {
        match self.lock().take() {
            Some(current) => current.send(()).is_ok(),
            None => false,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<oneshot::Sender<()>>> {
        // 锁内只做替换，不会在持锁时 panic
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occupy_cancels_previous() {
        let slot = UtteranceSlot::default();
        let mut first = slot.occupy();
        let mut second = slot.occupy();

        assert!(first.try_recv().is_ok());
        assert!(second.try_recv().is_err());

        assert!(slot.cancel());
        assert!(second.try_recv().is_ok());
        assert!(!slot.cancel());
    }
}
