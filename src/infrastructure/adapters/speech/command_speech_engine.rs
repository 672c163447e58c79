//! Command Speech Engine - 调用本地命令行 TTS 引擎朗读
//!
//! 每条朗读启动一个子进程，进程正常退出即视为读完；
//! stop 或新朗读会杀掉仍在运行的进程。

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::oneshot;

use super::UtteranceSlot;
use crate::application::ports::{
    SpeechEngineFactory, SpeechEnginePort, SpeechError, SpeechOptions, UtteranceCallback,
};
use crate::domain::playback::UtteranceOutcome;

/// espeak 系引擎 1.0 倍速对应的每分钟词数
const BASE_WORDS_PER_MINUTE: f32 = 175.0;
/// espeak 系引擎 1.0 倍音高对应的参数值
const BASE_PITCH: f32 = 50.0;

/// Command Speech Engine 配置
#[derive(Debug, Clone)]
pub struct CommandSpeechEngineConfig {
    /// 可执行文件，如 espeak-ng
    pub program: String,
    /// 覆盖语言标签的音色名（为空时使用 language_tag）
    pub voice: Option<String>,
    /// 追加在朗读文本之前的参数
    pub extra_args: Vec<String>,
}

impl Default for CommandSpeechEngineConfig {
    fn default() -> Self {
        Self {
            program: "espeak-ng".to_string(),
            voice: None,
            extra_args: Vec::new(),
        }
    }
}

/// Command Speech Engine
pub struct CommandSpeechEngine {
    config: CommandSpeechEngineConfig,
    slot: Arc<UtteranceSlot>,
}

impl CommandSpeechEngine {
    pub fn new(config: CommandSpeechEngineConfig) -> Self {
        tracing::debug!(program = %config.program, "CommandSpeechEngine created");
        Self {
            config,
            slot: Arc::new(UtteranceSlot::default()),
        }
    }

    /// 构造命令行参数：`-v 音色 -s 语速 -p 音高 [extra] -- 文本`
    ///
    /// `--` 之后的文本不会被当作选项，即使以 `-` 开头
    fn build_args(&self, text: &str, options: &SpeechOptions) -> Vec<String> {
        let voice = self
            .config
            .voice
            .clone()
            .unwrap_or_else(|| options.language_tag.to_lowercase());

        let mut args = vec![
            "-v".to_string(),
            voice,
            "-s".to_string(),
            ((options.rate * BASE_WORDS_PER_MINUTE).round() as u32).to_string(),
            "-p".to_string(),
            ((options.pitch * BASE_PITCH).round().clamp(0.0, 99.0) as u32).to_string(),
        ];
        args.extend(self.config.extra_args.iter().cloned());
        args.push("--".to_string());
        args.push(text.to_string());
        args
    }
}

impl SpeechEnginePort for CommandSpeechEngine {
    fn speak(&self, text: &str, options: &SpeechOptions, callback: UtteranceCallback) {
        let cancel = self.slot.occupy();

        let mut command = Command::new(&self.config.program);
        command
            .args(self.build_args(text, options))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(
            generation = %callback.generation(),
            chars = text.chars().count(),
            rate = options.rate,
            "Speaking utterance"
        );

        tokio::spawn(async move {
            let result = run_utterance(command, cancel).await;
            if let Err(e) = &result {
                tracing::warn!(generation = %callback.generation(), error = %e, "Speech command failed");
            }
            callback.resolve_with(result);
        });
    }

    fn stop(&self) {
        if self.slot.cancel() {
            tracing::debug!("Speech command cancelled");
        }
    }

    fn name(&self) -> &'static str {
        "command"
    }
}

/// 等待子进程结束或被取消
///
/// stderr 与等待同时读取，避免管道写满后子进程阻塞；
/// 非零退出时 stderr 内容随错误返回
async fn run_utterance(
    mut command: Command,
    cancel: oneshot::Receiver<()>,
) -> Result<UtteranceOutcome, SpeechError> {
    let mut child = command
        .spawn()
        .map_err(|e| SpeechError::SpawnFailed(e.to_string()))?;

    let mut stderr = child.stderr.take();
    let collect_stderr = async move {
        let mut output = String::new();
        if let Some(stderr) = stderr.as_mut() {
            let _ = stderr.read_to_string(&mut output).await;
        }
        output
    };
    let finished = async { tokio::join!(child.wait(), collect_stderr) };

    tokio::select! {
        (status, stderr_output) = finished => {
            let status = status.map_err(|e| SpeechError::AbnormalExit(e.to_string()))?;
            if status.success() {
                Ok(UtteranceOutcome::Done)
            } else {
                Err(SpeechError::AbnormalExit(describe_exit(status, &stderr_output)))
            }
        }
        _ = cancel => {
            if let Err(e) = child.kill().await {
                tracing::debug!(error = %e, "Speech process already exited");
            }
            Ok(UtteranceOutcome::Stopped)
        }
    }
}

fn describe_exit(status: ExitStatus, stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, stderr)
    }
}

/// 为每个会话创建独立的 CommandSpeechEngine
#[derive(Debug, Clone)]
pub struct CommandSpeechEngineFactory {
    config: CommandSpeechEngineConfig,
}

impl CommandSpeechEngineFactory {
    pub fn new(config: CommandSpeechEngineConfig) -> Self {
        tracing::info!(program = %config.program, "Using command speech engine");
        Self { config }
    }
}

impl SpeechEngineFactory for CommandSpeechEngineFactory {
    fn create(&self) -> Arc<dyn SpeechEnginePort> {
        Arc::new(CommandSpeechEngine::new(self.config.clone()))
    }
}
