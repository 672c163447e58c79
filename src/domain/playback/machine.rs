//! Playback - 顺序朗读状态机
//!
//! 纯状态机：不直接调用引擎，每个操作返回一组需要执行的副作用，
//! 由应用层的 PlaybackController 负责执行。

use super::state::{Generation, PlaybackState, Utterance, UtteranceOutcome};
use crate::domain::book::{Chapter, PlaybackPosition};
use crate::domain::line_splitter::LineSplitter;

/// 状态机产生的副作用，按顺序执行
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEffect {
    /// 停止引擎当前及排队中的朗读
    StopEngine,
    /// 请求朗读一行
    Speak(Utterance),
    /// 状态变化
    StateChanged(PlaybackState),
    /// 位置变化
    PositionChanged(PlaybackPosition),
    /// 写入阅读进度
    PersistProgress(PlaybackPosition),
    /// 当前代际的朗读失败
    Failed(String),
    /// 读到全书末尾
    Finished,
}

/// 顺序朗读状态机
///
/// 不变量:
/// - position 始终指向有效章节；章节非空时 line_index 始终是有效行
/// - 同一代际内至多只有一条未完成的朗读
/// - 非当前代际的回调不会改变 position 或 state
#[derive(Debug)]
pub struct PlaybackMachine {
    chapters: Vec<Chapter>,
    splitter: LineSplitter,
    lines: Vec<String>,
    position: PlaybackPosition,
    state: PlaybackState,
    generation: Generation,
}

impl PlaybackMachine {
    /// 在恢复的位置上创建状态机，位置会被夹到有效范围内
    pub fn new(chapters: Vec<Chapter>, start: PlaybackPosition, splitter: LineSplitter) -> Self {
        let mut machine = Self {
            chapters,
            splitter,
            lines: Vec::new(),
            position: PlaybackPosition::start(),
            state: PlaybackState::Idle,
            generation: Generation::default(),
        };
        machine.position = machine.clamp(start);
        machine.lines = machine.lines_of(machine.position.chapter_index);
        machine
    }

    // ========== Queries ==========

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn position(&self) -> PlaybackPosition {
        self.position
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        generation == self.generation
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn current_chapter(&self) -> Option<&Chapter> {
        self.chapters.get(self.position.chapter_index)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn current_line(&self) -> Option<&str> {
        self.lines.get(self.position.line_index).map(String::as_str)
    }

    // ========== Commands ==========

    /// Play：从 Idle / Stopped 开始朗读当前位置；正在朗读时忽略
    pub fn play(&mut self) -> Vec<PlaybackEffect> {
        if self.state == PlaybackState::Speaking {
            return Vec::new();
        }

        self.generation = self.generation.next();
        let mut effects = vec![PlaybackEffect::StopEngine];
        self.set_state(PlaybackState::Speaking, &mut effects);

        if self.lines.get(self.position.line_index).is_some() {
            self.push_speak(&mut effects);
        } else {
            self.roll_over(&mut effects);
        }
        effects
    }

    /// Stop：作废进行中的回调，停止引擎并写入进度
    pub fn stop(&mut self) -> Vec<PlaybackEffect> {
        self.generation = self.generation.next();
        let mut effects = vec![PlaybackEffect::StopEngine];
        self.set_state(PlaybackState::Stopped, &mut effects);
        effects.push(PlaybackEffect::PersistProgress(self.position));
        effects
    }

    /// SeekTo：隐式 Stop，然后跳到夹紧后的位置，保持停止
    pub fn seek_to(&mut self, target: PlaybackPosition) -> Vec<PlaybackEffect> {
        let mut effects = self.stop();
        let chapter_index = self.clamp_chapter(target.chapter_index);
        if chapter_index != self.position.chapter_index {
            self.lines = self.lines_of(chapter_index);
        }
        let line_index = target.line_index.min(self.lines.len().saturating_sub(1));
        self.move_to(PlaybackPosition::new(chapter_index, line_index), &mut effects);
        effects
    }

    /// 下一句：隐式 Stop，章节内前进一行，不跨章
    pub fn skip_forward(&mut self) -> Vec<PlaybackEffect> {
        self.skip(1)
    }

    /// 上一句：隐式 Stop，章节内后退一行，不跨章
    pub fn skip_backward(&mut self) -> Vec<PlaybackEffect> {
        self.skip(-1)
    }

    /// 引擎回调入口
    pub fn on_utterance_finished(
        &mut self,
        generation: Generation,
        outcome: UtteranceOutcome,
    ) -> Vec<PlaybackEffect> {
        if !self.is_current(generation) || self.state != PlaybackState::Speaking {
            return Vec::new();
        }

        let mut effects = Vec::new();
        match outcome {
            UtteranceOutcome::Done => self.advance(&mut effects),
            UtteranceOutcome::Stopped => {
                self.set_state(PlaybackState::Idle, &mut effects);
                effects.push(PlaybackEffect::PersistProgress(self.position));
            }
            UtteranceOutcome::Error(cause) => {
                self.set_state(PlaybackState::Idle, &mut effects);
                effects.push(PlaybackEffect::Failed(cause));
                effects.push(PlaybackEffect::PersistProgress(self.position));
            }
        }
        effects
    }

    // ========== Internals ==========

    fn skip(&mut self, delta: isize) -> Vec<PlaybackEffect> {
        let mut effects = self.stop();
        let last = self.lines.len().saturating_sub(1);
        let line_index = self
            .position
            .line_index
            .saturating_add_signed(delta)
            .min(last);
        self.move_to(
            PlaybackPosition::new(self.position.chapter_index, line_index),
            &mut effects,
        );
        effects
    }

    /// 当前行读完：章节内前进，章节读完则翻到下一个有内容的章节
    fn advance(&mut self, effects: &mut Vec<PlaybackEffect>) {
        let next = self.position.line_index + 1;
        if next < self.lines.len() {
            self.move_to(
                PlaybackPosition::new(self.position.chapter_index, next),
                effects,
            );
            self.push_speak(effects);
        } else {
            self.roll_over(effects);
        }
    }

    /// 翻到下一个有内容的章节；没有则读完全书，回到 Idle 并保留在最后一行
    fn roll_over(&mut self, effects: &mut Vec<PlaybackEffect>) {
        let next_chapter = (self.position.chapter_index + 1..self.chapters.len())
            .map(|index| (index, self.lines_of(index)))
            .find(|(_, lines)| !lines.is_empty());

        match next_chapter {
            Some((chapter_index, lines)) => {
                self.lines = lines;
                self.move_to(PlaybackPosition::new(chapter_index, 0), effects);
                self.push_speak(effects);
            }
            None => {
                self.set_state(PlaybackState::Idle, effects);
                effects.push(PlaybackEffect::Finished);
                effects.push(PlaybackEffect::PersistProgress(self.position));
            }
        }
    }

    fn push_speak(&self, effects: &mut Vec<PlaybackEffect>) {
        if let Some(text) = self.current_line() {
            effects.push(PlaybackEffect::Speak(Utterance {
                generation: self.generation,
                position: self.position,
                text: text.to_string(),
            }));
        }
    }

    fn move_to(&mut self, position: PlaybackPosition, effects: &mut Vec<PlaybackEffect>) {
        if position == self.position {
            return;
        }
        self.position = position;
        effects.push(PlaybackEffect::PositionChanged(position));
        if self.state != PlaybackState::Speaking {
            effects.push(PlaybackEffect::PersistProgress(position));
        }
    }

    fn set_state(&mut self, state: PlaybackState, effects: &mut Vec<PlaybackEffect>) {
        if self.state != state {
            self.state = state;
            effects.push(PlaybackEffect::StateChanged(state));
        }
    }

    fn lines_of(&self, chapter_index: usize) -> Vec<String> {
        self.chapters
            .get(chapter_index)
            .map(|chapter| self.splitter.split(chapter.content()))
            .unwrap_or_default()
    }

    fn clamp_chapter(&self, chapter_index: usize) -> usize {
        chapter_index.min(self.chapters.len().saturating_sub(1))
    }

    fn clamp(&self, position: PlaybackPosition) -> PlaybackPosition {
        let chapter_index = self.clamp_chapter(position.chapter_index);
        let line_count = self.lines_of(chapter_index).len();
        PlaybackPosition::new(
            chapter_index,
            position.line_index.min(line_count.saturating_sub(1)),
        )
    }
}
