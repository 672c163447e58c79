//! 章节分割器
//!
//! 用一组固定的启发式章节标题模式，把任意纯文本切分为有序的章节序列。
//! 分章总是成功：找不到可用的章节标题时整本书作为单章返回。

use std::sync::LazyLock;

use regex::Regex;

use super::book::Chapter;

/// 没有识别到任何章节标题时使用的章节标题
pub const MAIN_TEXT_TITLE: &str = "正文";

/// 第一个章节标题之前的内容使用的章节标题
pub const PROLOGUE_TITLE: &str = "序章/前言";

/// 章节标题模式（行首锚定，可带空格/制表符/全角空格缩进）
///
/// - `第N章` / `第N节` / `第N回`，N 为阿拉伯数字或中文数字
/// - `N.`
/// - `Chapter N`
/// - 罗马数字 `IVX.`
///
/// 标题占据整行：`第一章 开始` 整行都是标题文本。
const CHAPTER_MARKER_PATTERN: &str = r"(?m)^[ \t\x{3000}]*(?:第[0-9零一二三四五六七八九十百千万]+[章节回]|\d+\.|Chapter \d+|[IVX]+\.)[^\n]*";

static CHAPTER_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(CHAPTER_MARKER_PATTERN).expect("chapter marker pattern is a valid regex")
});

/// 去掉开头的 UTF-8 BOM，统一换行符为 `\n`
fn normalize_text(text: &str) -> String {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// 整本书作为单章
fn whole_text_chapter(normalized: &str) -> Vec<Chapter> {
    vec![Chapter::new(0, MAIN_TEXT_TITLE, normalized.trim())]
}

/// 对原始文本分章
///
/// 分章策略:
/// 1. 去掉 BOM，统一换行符
/// 2. 一次从左到右扫描，找出所有互不重叠的章节标题
/// 3. 第一个标题之前的非空内容作为序章
/// 4. 每个标题到下一个标题（或文末）之间的内容为该章正文，去除首尾空白
/// 5. 正文为空的章节被丢弃，索引按输出顺序连续编号
/// 6. 没有标题或全部章节为空时，回退为单章
///
/// 章节顺序只由在原文中的位置决定，不校验也不重排章节编号。
pub fn segment_chapters(raw_text: &str) -> Vec<Chapter> {
    let normalized = normalize_text(raw_text);
    let markers: Vec<_> = CHAPTER_MARKER.find_iter(&normalized).collect();

    let Some(first) = markers.first() else {
        return whole_text_chapter(&normalized);
    };

    let mut chapters: Vec<Chapter> = Vec::new();

    let prologue = normalized[..first.start()].trim();
    if !prologue.is_empty() {
        chapters.push(Chapter::new(chapters.len(), PROLOGUE_TITLE, prologue));
    }

    for (i, marker) in markers.iter().enumerate() {
        let end = markers
            .get(i + 1)
            .map(|next| next.start())
            .unwrap_or(normalized.len());
        let body = normalized[marker.end()..end].trim();

        if body.is_empty() {
            tracing::trace!(title = %marker.as_str().trim(), "Dropping empty chapter");
            continue;
        }

        chapters.push(Chapter::new(chapters.len(), marker.as_str().trim(), body));
    }

    if chapters.is_empty() {
        return whole_text_chapter(&normalized);
    }

    chapters
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(chapters: &[Chapter]) -> Vec<&str> {
        chapters.iter().map(|c| c.title()).collect()
    }

    #[test]
    fn test_chinese_chapter_headings() {
        let chapters = segment_chapters("第一章 开始\n内容A\n第二章 继续\n内容B");

        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0], Chapter::new(0, "第一章 开始", "内容A"));
        assert_eq!(chapters[1], Chapter::new(1, "第二章 继续", "内容B"));
    }

    #[test]
    fn test_no_marker_returns_main_text() {
        let chapters = segment_chapters("第一行\n第二行");

        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].index(), 0);
        assert_eq!(chapters[0].title(), MAIN_TEXT_TITLE);
        assert_eq!(chapters[0].content(), "第一行\n第二行");
    }

    #[test]
    fn test_no_marker_content_is_normalized_and_trimmed() {
        let chapters = segment_chapters("\r\n  一段话\r\n另一段话\r第三段  \n\n");

        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].content(), "一段话\n另一段话\n第三段");
    }

    #[test]
    fn test_prologue_before_first_marker() {
        let text = "作者的话：感谢阅读\n\n第1章 起点\n正文一\n第2章 终点\n正文二";
        let chapters = segment_chapters(text);

        assert_eq!(titles(&chapters), vec![PROLOGUE_TITLE, "第1章 起点", "第2章 终点"]);
        assert_eq!(chapters[0].content(), "作者的话：感谢阅读");
        assert_eq!(chapters[0].index(), 0);
        assert_eq!(chapters[2].index(), 2);
    }

    #[test]
    fn test_blank_prologue_is_skipped() {
        let chapters = segment_chapters("\n   \n第一回 开篇\n话说天下大势");

        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title(), "第一回 开篇");
        assert_eq!(chapters[0].index(), 0);
    }

    #[test]
    fn test_empty_chapters_are_dropped_and_indices_stay_dense() {
        let text = "第一章\n内容一\n第二章\n\n   \n第三章\n内容三";
        let chapters = segment_chapters(text);

        assert_eq!(titles(&chapters), vec!["第一章", "第三章"]);
        let indices: Vec<usize> = chapters.iter().map(|c| c.index()).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_markers_without_content_fall_back_to_whole_text() {
        let chapters = segment_chapters("第一章\n第二章\n");

        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title(), MAIN_TEXT_TITLE);
        assert_eq!(chapters[0].content(), "第一章\n第二章");
    }

    #[test]
    fn test_latin_numeric_and_roman_markers() {
        let text = "Chapter 1 The Boy\nalpha\n2. Second\nbeta\nIV. Fourth\ngamma";
        let chapters = segment_chapters(text);

        assert_eq!(titles(&chapters), vec!["Chapter 1 The Boy", "2. Second", "IV. Fourth"]);
        assert_eq!(chapters[2].content(), "gamma");
    }

    #[test]
    fn test_section_and_arabic_numeral_markers() {
        let text = "第12节 夜\n月色\n第百零一章 晨\n日出";
        let chapters = segment_chapters(text);

        assert_eq!(titles(&chapters), vec!["第12节 夜", "第百零一章 晨"]);
    }

    #[test]
    fn test_marker_must_start_a_line() {
        let chapters = segment_chapters("他说第一章写得很好\n然后合上了书");

        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title(), MAIN_TEXT_TITLE);
    }

    #[test]
    fn test_indented_marker_title_is_trimmed() {
        let chapters = segment_chapters("\u{3000}\u{3000}第三章 风起\n正文");

        assert_eq!(chapters[0].title(), "第三章 风起");
        assert_eq!(chapters[0].content(), "正文");
    }

    #[test]
    fn test_crlf_input() {
        let chapters = segment_chapters("第一章 开始\r\n内容A\r\n第二章 继续\r\n内容B\r\n");

        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].content(), "内容A");
        assert_eq!(chapters[1].content(), "内容B");
    }

    #[test]
    fn test_leading_bom_does_not_hide_first_heading() {
        let chapters = segment_chapters("\u{FEFF}第一章 开始\n内容A\n第二章 继续\n内容B");

        assert_eq!(titles(&chapters), vec!["第一章 开始", "第二章 继续"]);
        assert_eq!(chapters[0].content(), "内容A");
    }

    #[test]
    fn test_leading_bom_is_stripped_from_main_text() {
        let chapters = segment_chapters("\u{FEFF}没有章节标题的短文");

        assert_eq!(chapters[0].content(), "没有章节标题的短文");
    }

    #[test]
    fn test_out_of_order_numbering_is_positional() {
        let chapters = segment_chapters("第三章 后\n甲\n第一章 前\n乙\n第三章 后\n丙");

        assert_eq!(titles(&chapters), vec!["第三章 后", "第一章 前", "第三章 后"]);
        assert_eq!(chapters[2].content(), "丙");
    }

    #[test]
    fn test_contents_are_the_trimmed_spans_between_markers() {
        let spans = ["  甲乙丙\n丁  ", "\n戊己\n\n庚", "辛"];
        let text = format!("第一章 A\n{}\n第二章 B\n{}\n第三章 C\n{}", spans[0], spans[1], spans[2]);
        let chapters = segment_chapters(&text);

        let contents: Vec<&str> = chapters.iter().map(|c| c.content()).collect();
        let expected: Vec<&str> = spans.iter().map(|s| s.trim()).collect();
        assert_eq!(contents, expected);
    }
}
