//! 行分割器
//!
//! 把章节正文切分为朗读单位（行或短句）。每个单位都是去除首尾空白后的非空字符串。

use serde::{Deserialize, Serialize};

/// 句子模式下默认的最小字符数
/// 片段字符数未达到此限制时，弱分隔符不会触发分割
pub const DEFAULT_MIN_SENTENCE_CHARS: usize = 20;

/// 朗读单位的粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMode {
    /// 严格按换行分割
    Line,
    /// 在行内再按标点切成短句（不跨行合并）
    Sentence,
}

impl Default for SplitMode {
    fn default() -> Self {
        SplitMode::Line
    }
}

/// 行分割配置
#[derive(Debug, Clone)]
pub struct SplitConfig {
    pub mode: SplitMode,
    /// 句子模式下的最小字符数（用于合并短句）
    pub min_sentence_chars: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            mode: SplitMode::Line,
            min_sentence_chars: DEFAULT_MIN_SENTENCE_CHARS,
        }
    }
}

/// 按换行分割，去除首尾空白并丢弃空行
///
/// 幂等：对已分割结果用 `\n` 拼接后再次分割，得到相同序列。
pub fn split_lines(content: &str) -> Vec<String> {
    content
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// 句末标点，总是分割
#[inline]
fn is_strong_delimiter(ch: char) -> bool {
    matches!(ch, '。' | '？' | '！' | '.' | '?' | '!')
}

/// 逗号等，片段达到最小字符数时才分割
#[inline]
fn is_weak_delimiter(ch: char) -> bool {
    matches!(ch, '，' | '；' | '：' | ',' | ';' | ':')
}

/// 只包含引号或空白的片段
#[inline]
fn is_quote_only(s: &str) -> bool {
    s.chars().all(|c| {
        matches!(
            c,
            '"' | '\u{201C}' | '\u{201D}' | '\'' | '\u{2018}' | '\u{2019}' | ' ' | '\t'
        )
    })
}

/// 把单行按标点切开（不合并）
fn cut_at_delimiters(line: &str, min_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut count = 0;

    for ch in line.chars() {
        current.push(ch);
        count += 1;

        if is_strong_delimiter(ch) || (is_weak_delimiter(ch) && count >= min_chars) {
            let piece = current.trim();
            if !piece.is_empty() {
                pieces.push(piece.to_string());
            }
            current.clear();
            count = 0;
        }
    }

    let rest = current.trim();
    if !rest.is_empty() {
        pieces.push(rest.to_string());
    }

    pieces
}

/// 行内合并短片段直到满足 min_chars，尾部不足的并入前一个
fn merge_short_pieces(pieces: Vec<String>, min_chars: usize) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    let mut buffer = String::new();

    for piece in pieces {
        buffer.push_str(&piece);
        if buffer.chars().count() >= min_chars {
            merged.push(std::mem::take(&mut buffer));
        }
    }

    if !buffer.is_empty() {
        match merged.last_mut() {
            Some(last) => last.push_str(&buffer),
            None => merged.push(buffer),
        }
    }

    merged
}

/// 按句分割：先按行，再在行内按标点切分并合并短句
///
/// 只有引号的片段并入前一个单位。
fn split_sentences(content: &str, min_chars: usize) -> Vec<String> {
    let mut units: Vec<String> = Vec::new();

    for line in split_lines(content) {
        let pieces = merge_short_pieces(cut_at_delimiters(&line, min_chars), min_chars);
        for piece in pieces {
            if is_quote_only(&piece) {
                if let Some(last) = units.last_mut() {
                    last.push_str(&piece);
                }
            } else {
                units.push(piece);
            }
        }
    }

    units
}

/// 行分割器
#[derive(Debug, Clone, Default)]
pub struct LineSplitter {
    config: SplitConfig,
}

impl LineSplitter {
    pub fn new(config: SplitConfig) -> Self {
        Self { config }
    }

    pub fn mode(&self) -> SplitMode {
        self.config.mode
    }

    /// 把章节正文切分为朗读单位
    pub fn split(&self, content: &str) -> Vec<String> {
        match self.config.mode {
            SplitMode::Line => split_lines(content),
            SplitMode::Sentence => split_sentences(content, self.config.min_sentence_chars),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence_splitter(min_chars: usize) -> LineSplitter {
        LineSplitter::new(SplitConfig {
            mode: SplitMode::Sentence,
            min_sentence_chars: min_chars,
        })
    }

    #[test]
    fn test_split_lines_discards_blank_lines() {
        let lines = split_lines("  第一行 \n\n \t \n第二行\r\n第三行");
        assert_eq!(lines, vec!["第一行", "第二行", "第三行"]);
    }

    #[test]
    fn test_split_lines_empty_input() {
        assert!(split_lines("").is_empty());
        assert!(split_lines("\n \n").is_empty());
    }

    #[test]
    fn test_split_lines_is_idempotent() {
        let text = "\n  甲\n\n乙  \n\u{3000}丙\u{3000}\n";
        let once = split_lines(text);
        let twice = split_lines(&once.join("\n"));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_single_line_unchanged() {
        assert_eq!(split_lines("没有换行的一句话"), vec!["没有换行的一句话"]);
    }

    #[test]
    fn test_default_splitter_uses_line_mode() {
        let splitter = LineSplitter::default();
        assert_eq!(splitter.mode(), SplitMode::Line);
        assert_eq!(splitter.split("一句。两句。\n三句"), vec!["一句。两句。", "三句"]);
    }

    #[test]
    fn test_sentence_mode_strong_delimiters_merge_short() {
        let units = sentence_splitter(100).split("短。短？短！");
        assert_eq!(units, vec!["短。短？短！"]);
    }

    #[test]
    fn test_sentence_mode_weak_delimiter_respects_min_chars() {
        let units = sentence_splitter(10).split("这是一段很长的文字内容，另一段也很长的内容。");
        assert_eq!(units, vec!["这是一段很长的文字内容，", "另一段也很长的内容。"]);

        let units = sentence_splitter(20).split("所以，如今想要讨还回去吧，苦涩的一笑。");
        assert_eq!(units.len(), 1);
    }

    #[test]
    fn test_sentence_mode_never_merges_across_lines() {
        let units = sentence_splitter(50).split("第一行。\n第二行。");
        assert_eq!(units, vec!["第一行。", "第二行。"]);
    }

    #[test]
    fn test_sentence_mode_folds_quote_only_piece() {
        let units = sentence_splitter(10).split("这是一段较长的内容测试。\n\"\n这是另一段较长的测试内容。");
        assert_eq!(units.len(), 2);
        assert!(units[0].ends_with('"'));
    }

    #[test]
    fn test_quote_only_detection() {
        assert!(is_quote_only("\""));
        assert!(is_quote_only("\u{201D} "));
        assert!(!is_quote_only("内容"));
    }
}
