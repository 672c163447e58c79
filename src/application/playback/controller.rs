//! Playback Controller - 单本书的朗读 actor
//!
//! 一个 tokio 任务独占 [`PlaybackMachine`] 和语音引擎。
//! 用户命令与引擎回调在同一个收件箱里串行处理，回调优先。

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::application::ports::{
    EventSinkPort, ProgressTrackerPort, ReaderEvent, SpeechEnginePort, SpeechOptions,
    UtteranceCallback, UtteranceCompletion,
};
use crate::domain::book::{Chapter, PlaybackPosition};
use crate::domain::line_splitter::LineSplitter;
use crate::domain::playback::{PlaybackEffect, PlaybackMachine, PlaybackState};

/// 允许的语速范围
pub const MIN_RATE: f32 = 0.5;
pub const MAX_RATE: f32 = 2.0;

const COMMAND_BUFFER: usize = 32;

/// 播放控制错误
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Playback controller has shut down")]
    ControllerGone,

    #[error("Invalid speech rate {0}, expected 0.5..=2.0")]
    InvalidRate(f32),
}

/// 控制器启动参数
#[derive(Debug, Clone)]
pub struct PlaybackSetup {
    pub session_id: String,
    pub book_id: Uuid,
    pub chapters: Vec<Chapter>,
    pub start: PlaybackPosition,
    pub splitter: LineSplitter,
    pub options: SpeechOptions,
}

/// 播放状态快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackSnapshot {
    pub session_id: String,
    pub book_id: Uuid,
    pub state: PlaybackState,
    pub position: PlaybackPosition,
    pub chapter_title: Option<String>,
    pub line_count: usize,
    pub current_line: Option<String>,
    pub rate: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PlaybackCommand {
    Play,
    Stop,
    SeekTo(PlaybackPosition),
    SkipForward,
    SkipBackward,
    SetRate(f32),
    Status,
    Close,
}

#[derive(Debug)]
struct Envelope {
    command: PlaybackCommand,
    reply: oneshot::Sender<PlaybackSnapshot>,
}

/// 控制器句柄
///
/// 可以自由克隆；所有句柄都被丢弃后控制器会自行收尾退出
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    session_id: String,
    sender: mpsc::Sender<Envelope>,
}

impl PlaybackHandle {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    pub async fn play(&self) -> Result<PlaybackSnapshot, PlaybackError> {
        self.send(PlaybackCommand::Play).await
    }

    pub async fn stop(&self) -> Result<PlaybackSnapshot, PlaybackError> {
        self.send(PlaybackCommand::Stop).await
    }

    pub async fn seek_to(&self, position: PlaybackPosition) -> Result<PlaybackSnapshot, PlaybackError> {
        self.send(PlaybackCommand::SeekTo(position)).await
    }

    pub async fn skip_forward(&self) -> Result<PlaybackSnapshot, PlaybackError> {
        self.send(PlaybackCommand::SkipForward).await
    }

    pub async fn skip_backward(&self) -> Result<PlaybackSnapshot, PlaybackError> {
        self.send(PlaybackCommand::SkipBackward).await
    }

    pub async fn set_rate(&self, rate: f32) -> Result<PlaybackSnapshot, PlaybackError> {
        if !(MIN_RATE..=MAX_RATE).contains(&rate) {
            return Err(PlaybackError::InvalidRate(rate));
        }
        self.send(PlaybackCommand::SetRate(rate)).await
    }

    pub async fn status(&self) -> Result<PlaybackSnapshot, PlaybackError> {
        self.send(PlaybackCommand::Status).await
    }

    /// 停止朗读、写入进度并结束控制器
    pub async fn close(&self) -> Result<PlaybackSnapshot, PlaybackError> {
        self.send(PlaybackCommand::Close).await
    }

    async fn send(&self, command: PlaybackCommand) -> Result<PlaybackSnapshot, PlaybackError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Envelope { command, reply })
            .await
            .map_err(|_| PlaybackError::ControllerGone)?;
        response.await.map_err(|_| PlaybackError::ControllerGone)
    }
}

#[cfg(test)]
impl PlaybackHandle {
    /// 没有控制器在运行的句柄
    pub(crate) fn detached(session_id: &str) -> Self {
        let (sender, _) = mpsc::channel(1);
        Self {
            session_id: session_id.to_string(),
            sender,
        }
    }
}

/// 朗读控制器
pub struct PlaybackController {
    session_id: String,
    book_id: Uuid,
    machine: PlaybackMachine,
    options: SpeechOptions,
    engine: Arc<dyn SpeechEnginePort>,
    progress: Arc<dyn ProgressTrackerPort>,
    events: Arc<dyn EventSinkPort>,
    commands: mpsc::Receiver<Envelope>,
    completion_tx: mpsc::UnboundedSender<UtteranceCompletion>,
    completion_rx: mpsc::UnboundedReceiver<UtteranceCompletion>,
}

impl PlaybackController {
    pub fn new(
        setup: PlaybackSetup,
        engine: Arc<dyn SpeechEnginePort>,
        progress: Arc<dyn ProgressTrackerPort>,
        events: Arc<dyn EventSinkPort>,
    ) -> (Self, PlaybackHandle) {
        let (sender, commands) = mpsc::channel(COMMAND_BUFFER);
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        let handle = PlaybackHandle {
            session_id: setup.session_id.clone(),
            sender,
        };
        let controller = Self {
            session_id: setup.session_id,
            book_id: setup.book_id,
            machine: PlaybackMachine::new(setup.chapters, setup.start, setup.splitter),
            options: setup.options,
            engine,
            progress,
            events,
            commands,
            completion_tx,
            completion_rx,
        };
        (controller, handle)
    }

    /// 启动控制器循环，直到 Close 或所有句柄被丢弃
    pub async fn run(mut self) {
        tracing::info!(
            session_id = %self.session_id,
            book_id = %self.book_id,
            position = %self.machine.position(),
            engine = self.engine.name(),
            "PlaybackController started"
        );

        loop {
            tokio::select! {
                biased;

                Some(completion) = self.completion_rx.recv() => {
                    self.on_completion(completion);
                }

                envelope = self.commands.recv() => match envelope {
                    Some(Envelope { command: PlaybackCommand::Close, reply }) => {
                        self.shutdown("closed");
                        let _ = reply.send(self.snapshot());
                        break;
                    }
                    Some(envelope) => {
                        self.handle(envelope.command);
                        let _ = envelope.reply.send(self.snapshot());
                    }
                    None => {
                        self.shutdown("all handles dropped");
                        break;
                    }
                },
            }
        }

        tracing::info!(session_id = %self.session_id, "PlaybackController stopped");
    }

    fn handle(&mut self, command: PlaybackCommand) {
        tracing::debug!(session_id = %self.session_id, ?command, "Playback command");

        let effects = match command {
            PlaybackCommand::Play => self.machine.play(),
            PlaybackCommand::Stop => self.machine.stop(),
            PlaybackCommand::SeekTo(position) => self.machine.seek_to(position),
            PlaybackCommand::SkipForward => self.machine.skip_forward(),
            PlaybackCommand::SkipBackward => self.machine.skip_backward(),
            PlaybackCommand::SetRate(rate) => {
                self.options.rate = rate;
                Vec::new()
            }
            PlaybackCommand::Status | PlaybackCommand::Close => Vec::new(),
        };
        self.apply(effects);
    }

    fn on_completion(&mut self, completion: UtteranceCompletion) {
        if !self.machine.is_current(completion.generation) {
            tracing::debug!(
                session_id = %self.session_id,
                generation = %completion.generation,
                current = %self.machine.generation(),
                outcome = ?completion.outcome,
                "Ignoring stale utterance callback"
            );
            return;
        }

        let effects = self
            .machine
            .on_utterance_finished(completion.generation, completion.outcome);
        self.apply(effects);
    }

    fn shutdown(&mut self, reason: &str) {
        let effects = self.machine.stop();
        self.apply(effects);
        self.events.publish_session(
            &self.session_id,
            ReaderEvent::SessionClosed {
                session_id: self.session_id.clone(),
                reason: reason.to_string(),
            },
        );
        tracing::info!(
            session_id = %self.session_id,
            position = %self.machine.position(),
            reason,
            "Playback session closed"
        );
    }

    fn apply(&mut self, effects: Vec<PlaybackEffect>) {
        for effect in effects {
            match effect {
                PlaybackEffect::StopEngine => self.engine.stop(),
                PlaybackEffect::Speak(utterance) => {
                    self.publish(ReaderEvent::Speaking {
                        session_id: self.session_id.clone(),
                        chapter_index: utterance.position.chapter_index,
                        line_index: utterance.position.line_index,
                        text: utterance.text.clone(),
                    });
                    let callback =
                        UtteranceCallback::new(utterance.generation, self.completion_tx.clone());
                    self.engine.speak(&utterance.text, &self.options, callback);
                }
                PlaybackEffect::StateChanged(state) => {
                    self.publish(ReaderEvent::StateChanged {
                        session_id: self.session_id.clone(),
                        book_id: self.book_id,
                        state,
                    });
                }
                PlaybackEffect::PositionChanged(position) => {
                    self.publish(ReaderEvent::PositionChanged {
                        session_id: self.session_id.clone(),
                        book_id: self.book_id,
                        chapter_index: position.chapter_index,
                        line_index: position.line_index,
                    });
                }
                PlaybackEffect::PersistProgress(position) => {
                    self.progress.persist(self.book_id, position);
                }
                PlaybackEffect::Failed(error) => {
                    tracing::warn!(
                        session_id = %self.session_id,
                        position = %self.machine.position(),
                        error = %error,
                        "Utterance failed, playback stopped"
                    );
                    self.publish(ReaderEvent::PlaybackFailed {
                        session_id: self.session_id.clone(),
                        error,
                    });
                }
                PlaybackEffect::Finished => {
                    tracing::info!(session_id = %self.session_id, book_id = %self.book_id, "Reached end of book");
                    self.publish(ReaderEvent::Finished {
                        session_id: self.session_id.clone(),
                        book_id: self.book_id,
                    });
                }
            }
        }
    }

    fn publish(&self, event: ReaderEvent) {
        self.events.publish_session(&self.session_id, event);
    }

    fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            session_id: self.session_id.clone(),
            book_id: self.book_id,
            state: self.machine.state(),
            position: self.machine.position(),
            chapter_title: self.machine.current_chapter().map(|c| c.title().to_string()),
            line_count: self.machine.lines().len(),
            current_line: self.machine.current_line().map(str::to_string),
            rate: self.options.rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::playback::UtteranceOutcome;
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedEngine {
        spoken: Mutex<Vec<(String, f32)>>,
        pending: Mutex<Option<UtteranceCallback>>,
        stops: Mutex<usize>,
    }

    impl ScriptedEngine {
        fn spoken(&self) -> Vec<String> {
            self.spoken.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
        }

        fn last_rate(&self) -> Option<f32> {
            self.spoken.lock().unwrap().last().map(|(_, r)| *r)
        }

        fn take_pending(&self) -> Option<UtteranceCallback> {
            self.pending.lock().unwrap().take()
        }

        fn finish(&self, outcome: UtteranceOutcome) {
            if let Some(callback) = self.take_pending() {
                callback.resolve(outcome);
            }
        }
    }

    impl SpeechEnginePort for ScriptedEngine {
        fn speak(&self, text: &str, options: &SpeechOptions, callback: UtteranceCallback) {
            self.spoken.lock().unwrap().push((text.to_string(), options.rate));
            *self.pending.lock().unwrap() = Some(callback);
        }

        fn stop(&self) {
            *self.stops.lock().unwrap() += 1;
            self.pending.lock().unwrap().take();
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    #[derive(Default)]
    struct RecordingTracker {
        writes: Mutex<Vec<PlaybackPosition>>,
    }

    impl RecordingTracker {
        fn last(&self) -> Option<PlaybackPosition> {
            self.writes.lock().unwrap().last().copied()
        }
    }

    impl ProgressTrackerPort for RecordingTracker {
        fn persist(&self, _book_id: Uuid, position: PlaybackPosition) {
            self.writes.lock().unwrap().push(position);
        }
    }

    #[derive(Default)]
    struct RecordingEvents {
        events: Mutex<Vec<ReaderEvent>>,
    }

    impl EventSinkPort for RecordingEvents {
        fn publish_session(&self, _session_id: &str, event: ReaderEvent) {
            self.events.lock().unwrap().push(event);
        }

        fn publish_global(&self, event: ReaderEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    struct Harness {
        handle: PlaybackHandle,
        engine: Arc<ScriptedEngine>,
        tracker: Arc<RecordingTracker>,
        events: Arc<RecordingEvents>,
        task: tokio::task::JoinHandle<()>,
    }

    fn spawn(chapters: Vec<Chapter>, start: PlaybackPosition) -> Harness {
        let engine = Arc::new(ScriptedEngine::default());
        let tracker = Arc::new(RecordingTracker::default());
        let events = Arc::new(RecordingEvents::default());
        let setup = PlaybackSetup {
            session_id: "session-1".to_string(),
            book_id: Uuid::new_v4(),
            chapters,
            start,
            splitter: LineSplitter::default(),
            options: SpeechOptions::default(),
        };
        let (controller, handle) =
            PlaybackController::new(setup, engine.clone(), tracker.clone(), events.clone());
        let task = tokio::spawn(controller.run());
        Harness {
            handle,
            engine,
            tracker,
            events,
            task,
        }
    }

    fn two_chapters() -> Vec<Chapter> {
        vec![
            Chapter::new(0, "第一章", "甲一\n甲二\n甲三"),
            Chapter::new(1, "第二章", "乙一\n乙二"),
        ]
    }

    #[tokio::test]
    async fn test_play_advances_on_done() {
        let h = spawn(two_chapters(), PlaybackPosition::start());

        let snapshot = h.handle.play().await.unwrap();
        assert_eq!(snapshot.state, PlaybackState::Speaking);
        assert_eq!(snapshot.current_line.as_deref(), Some("甲一"));

        h.engine.finish(UtteranceOutcome::Done);
        let snapshot = h.handle.status().await.unwrap();

        assert_eq!(snapshot.position, PlaybackPosition::new(0, 1));
        assert_eq!(h.engine.spoken(), vec!["甲一", "甲二"]);
    }

    #[tokio::test]
    async fn test_stop_ignores_late_callback() {
        let h = spawn(two_chapters(), PlaybackPosition::new(0, 1));
        h.handle.play().await.unwrap();

        let late = h.engine.take_pending().unwrap();
        let snapshot = h.handle.stop().await.unwrap();
        assert_eq!(snapshot.state, PlaybackState::Stopped);

        late.resolve(UtteranceOutcome::Done);
        let snapshot = h.handle.status().await.unwrap();

        assert_eq!(snapshot.state, PlaybackState::Stopped);
        assert_eq!(snapshot.position, PlaybackPosition::new(0, 1));
        assert_eq!(h.engine.spoken(), vec!["甲二"]);
        assert_eq!(h.tracker.last(), Some(PlaybackPosition::new(0, 1)));
    }

    #[tokio::test]
    async fn test_rolls_over_to_next_chapter() {
        let h = spawn(two_chapters(), PlaybackPosition::new(0, 2));
        h.handle.play().await.unwrap();

        h.engine.finish(UtteranceOutcome::Done);
        let snapshot = h.handle.status().await.unwrap();

        assert_eq!(snapshot.position, PlaybackPosition::new(1, 0));
        assert_eq!(snapshot.chapter_title.as_deref(), Some("第二章"));
        assert_eq!(h.engine.spoken(), vec!["甲三", "乙一"]);
    }

    #[tokio::test]
    async fn test_end_of_book_goes_idle_and_flushes() {
        let h = spawn(two_chapters(), PlaybackPosition::new(1, 1));
        h.handle.play().await.unwrap();

        h.engine.finish(UtteranceOutcome::Done);
        let snapshot = h.handle.status().await.unwrap();

        assert_eq!(snapshot.state, PlaybackState::Idle);
        assert_eq!(snapshot.position, PlaybackPosition::new(1, 1));
        assert_eq!(h.tracker.last(), Some(PlaybackPosition::new(1, 1)));
        assert!(h
            .events
            .events
            .lock()
            .unwrap()
            .iter()
            .any(|e| matches!(e, ReaderEvent::Finished { .. })));
    }

    #[tokio::test]
    async fn test_engine_error_stops_playback() {
        let h = spawn(two_chapters(), PlaybackPosition::start());
        h.handle.play().await.unwrap();

        h.engine.finish(UtteranceOutcome::Error("device busy".to_string()));
        let snapshot = h.handle.status().await.unwrap();

        assert_eq!(snapshot.state, PlaybackState::Idle);
        assert_eq!(snapshot.position, PlaybackPosition::start());
        assert_eq!(h.engine.spoken().len(), 1);
        assert!(h.events.events.lock().unwrap().iter().any(|e| matches!(
            e,
            ReaderEvent::PlaybackFailed { error, .. } if error == "device busy"
        )));
    }

    #[tokio::test]
    async fn test_dropped_callback_counts_as_stopped() {
        let h = spawn(two_chapters(), PlaybackPosition::start());
        h.handle.play().await.unwrap();

        drop(h.engine.take_pending());
        let snapshot = h.handle.status().await.unwrap();

        assert_eq!(snapshot.state, PlaybackState::Idle);
        assert_eq!(h.engine.spoken().len(), 1);
    }

    #[tokio::test]
    async fn test_skip_and_seek_persist_new_position() {
        let h = spawn(two_chapters(), PlaybackPosition::start());

        let snapshot = h.handle.skip_forward().await.unwrap();
        assert_eq!(snapshot.position, PlaybackPosition::new(0, 1));
        assert_eq!(h.tracker.last(), Some(PlaybackPosition::new(0, 1)));

        let snapshot = h.handle.seek_to(PlaybackPosition::new(9, 9)).await.unwrap();
        assert_eq!(snapshot.position, PlaybackPosition::new(1, 1));
        assert_eq!(snapshot.state, PlaybackState::Stopped);
        assert_eq!(h.tracker.last(), Some(PlaybackPosition::new(1, 1)));
        assert!(h.engine.spoken().is_empty());
    }

    #[tokio::test]
    async fn test_set_rate_applies_to_next_utterance() {
        let h = spawn(two_chapters(), PlaybackPosition::start());

        assert!(matches!(
            h.handle.set_rate(3.0).await,
            Err(PlaybackError::InvalidRate(_))
        ));

        let snapshot = h.handle.set_rate(1.5).await.unwrap();
        assert_eq!(snapshot.rate, 1.5);
        assert_eq!(snapshot.state, PlaybackState::Idle);

        h.handle.play().await.unwrap();
        assert_eq!(h.engine.last_rate(), Some(1.5));
    }

    #[tokio::test]
    async fn test_close_flushes_and_shuts_down() {
        let h = spawn(two_chapters(), PlaybackPosition::start());
        h.handle.play().await.unwrap();
        h.engine.finish(UtteranceOutcome::Done);

        let snapshot = h.handle.close().await.unwrap();
        assert_eq!(snapshot.state, PlaybackState::Stopped);
        assert_eq!(h.tracker.last(), Some(PlaybackPosition::new(0, 1)));

        h.task.await.unwrap();
        assert!(h.handle.is_closed());
        assert!(matches!(
            h.handle.status().await,
            Err(PlaybackError::ControllerGone)
        ));
        assert!(*h.engine.stops.lock().unwrap() >= 2);
    }

    #[tokio::test]
    async fn test_dropping_all_handles_tears_down() {
        let h = spawn(two_chapters(), PlaybackPosition::new(0, 2));
        h.handle.play().await.unwrap();

        drop(h.handle);
        h.task.await.unwrap();

        assert_eq!(h.tracker.last(), Some(PlaybackPosition::new(0, 2)));
        assert!(h
            .events
            .events
            .lock()
            .unwrap()
            .iter()
            .any(|e| matches!(e, ReaderEvent::SessionClosed { reason, .. } if reason == "all handles dropped")));
    }
}
