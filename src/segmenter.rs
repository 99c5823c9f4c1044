//! 文档分块模块
//!
//! 按 Markdown 标题（`#` 到 `####`）把文档切分为有序的块。
//! 源文档与已有译文使用同一套切分规则，以便按标题匹配。

use crate::types::{Block, LineSpan, TargetBlockIndex, TranslatedBlock};
use once_cell::sync::Lazy;
use regex::Regex;

/// 标题行：1 到 4 个 `#`，空白，非空标题文本
static HEADER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(#{1,4})[ \t]+(\S[^\n]*)$").expect("header pattern is valid")
});

/// 字节偏移到行号（从 1 开始）的换算
struct LineIndex {
    newlines: Vec<usize>,
    total_lines: usize,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let newlines = text
            .char_indices()
            .filter(|(_, c)| *c == '\n')
            .map(|(i, _)| i)
            .collect();
        Self {
            newlines,
            total_lines: text.lines().count().max(1),
        }
    }

    fn line_of(&self, offset: usize) -> usize {
        self.newlines.partition_point(|&nl| nl < offset) + 1
    }
}

/// 按 Markdown 标题将内容分块
///
/// 返回的块顺序与文档顺序一致：
///
/// * 第一个标题之前若有非空内容，生成 `header`/`title` 为空的前置块；
/// * 每个标题的正文是它与下一个标题之间的文本，去掉首尾空白；
/// * 文档以标题结尾时，该块正文为空；
/// * 没有任何标题时，返回唯一一个 `header`/`title` 为空的块。
///
/// 每个块同时记录它在原始文档中占据的行范围：从标题行开始，
/// 到下一个标题行的前一行为止。
///
/// # 示例
///
/// ```rust
/// use readme_translator::segment;
///
/// let blocks = segment("# Title\n\nHello\n\n## Sub\n\nWorld\n");
/// assert_eq!(blocks.len(), 2);
/// assert_eq!(blocks[1].header, "## Sub");
/// assert_eq!(blocks[1].title, "Sub");
/// assert_eq!(blocks[1].body, "World");
/// assert_eq!((blocks[1].span.start, blocks[1].span.end), (5, 7));
/// ```
pub fn segment(document: &str) -> Vec<Block> {
    let index = LineIndex::new(document);

    let mut blocks = Vec::new();
    let mut last_pos = 0;
    let mut last_header = String::new();
    let mut last_title = String::new();
    let mut last_line = 1;

    for caps in HEADER_PATTERN.captures_iter(document) {
        let (Some(whole), Some(title)) = (caps.get(0), caps.get(2)) else {
            continue;
        };

        if last_pos > 0 || whole.start() > 0 {
            let body = document[last_pos..whole.start()].trim();
            if !last_header.is_empty() || !body.is_empty() {
                blocks.push(Block {
                    header: std::mem::take(&mut last_header),
                    title: std::mem::take(&mut last_title),
                    body: body.to_string(),
                    span: LineSpan::new(last_line, index.line_of(whole.start()) - 1),
                });
            }
        }

        last_header = whole.as_str().trim_end().to_string();
        last_title = title.as_str().trim().to_string();
        last_line = index.line_of(whole.start());
        // 跳过标题行末尾的换行符
        last_pos = (whole.end() + 1).min(document.len());
    }

    if last_pos < document.len() {
        blocks.push(Block {
            header: last_header,
            title: last_title,
            body: document[last_pos..].trim().to_string(),
            span: LineSpan::new(last_line, index.total_lines),
        });
    } else if !last_header.is_empty() {
        blocks.push(Block {
            header: last_header,
            title: last_title,
            body: String::new(),
            span: LineSpan::new(last_line, last_line),
        });
    }

    if blocks.is_empty() {
        blocks.push(Block {
            header: String::new(),
            title: String::new(),
            body: document.trim().to_string(),
            span: LineSpan::new(1, index.total_lines),
        });
    }

    blocks
}

/// 切分已有译文并按标题建立索引，重复标题以最后一次出现为准
pub fn build_target_index(document: &str) -> TargetBlockIndex {
    segment(document)
        .into_iter()
        .map(|block| (block.title, TranslatedBlock::new(block.header, block.body)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejoin(blocks: &[Block]) -> String {
        blocks
            .iter()
            .flat_map(|b| [b.header.as_str(), b.body.as_str()])
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn spans(blocks: &[Block]) -> Vec<(usize, usize)> {
        blocks.iter().map(|b| (b.span.start, b.span.end)).collect()
    }

    #[test]
    fn preamble_becomes_untitled_block() {
        let doc = "<p align=\"center\">logo</p>\n\n# Project\n\nIntro\n\n## Install\n\n```bash\nmake\n```\n";
        let blocks = segment(doc);

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].header, "");
        assert_eq!(blocks[0].title, "");
        assert_eq!(blocks[0].body, "<p align=\"center\">logo</p>");
        assert_eq!(blocks[1].title, "Project");
        assert_eq!(blocks[2].header, "## Install");
        assert_eq!(blocks[2].body, "```bash\nmake\n```");
        assert_eq!(spans(&blocks), vec![(1, 2), (3, 6), (7, 11)]);
    }

    #[test]
    fn heading_count_determines_block_count() {
        let without_preamble = "# A\none\n## B\ntwo\n### C\nthree\n#### D\nfour";
        assert_eq!(segment(without_preamble).len(), 4);

        let with_preamble = format!("intro text\n{}", without_preamble);
        assert_eq!(segment(&with_preamble).len(), 5);
    }

    #[test]
    fn no_headings_yields_single_untitled_block() {
        for doc in ["just text\n\nmore text\n", "", "   \n\n", "##### too deep\n", "#nospace\n"] {
            let blocks = segment(doc);
            assert_eq!(blocks.len(), 1, "document: {:?}", doc);
            assert_eq!(blocks[0].header, "");
            assert_eq!(blocks[0].title, "");
            assert_eq!(blocks[0].body, doc.trim());
        }
    }

    #[test]
    fn trailing_heading_has_empty_body() {
        let blocks = segment("# A\n\nbody\n\n## End\n");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].title, "End");
        assert_eq!(blocks[1].body, "");
        assert_eq!(blocks[1].span, LineSpan::new(5, 5));

        let blocks = segment("# A\nbody\n## End");
        assert_eq!(blocks[1].header, "## End");
        assert_eq!(blocks[1].body, "");
    }

    #[test]
    fn consecutive_headings_keep_empty_bodies() {
        let blocks = segment("# A\n## B\n### C\ntext\n");
        let titles: Vec<_> = blocks.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
        assert_eq!(blocks[0].body, "");
        assert_eq!(blocks[1].body, "");
        assert_eq!(blocks[2].body, "text");
        assert_eq!(spans(&blocks), vec![(1, 1), (2, 2), (3, 4)]);
    }

    #[test]
    fn segment_then_join_is_near_idempotent() {
        let doc = "Intro line\n\n# Title\n\nHello\nworld\n\n## Sub\n\n- a\n- b\n\n### Deep\n\nend\n";
        let blocks = segment(doc);
        assert_eq!(rejoin(&blocks), doc.trim());
        assert_eq!(rejoin(&segment(&rejoin(&blocks))), rejoin(&blocks));
    }

    #[test]
    fn titles_are_trimmed_and_crlf_tolerated() {
        let blocks = segment("#   Spaced Title   \r\nbody\r\n");
        assert_eq!(blocks[0].title, "Spaced Title");
        assert_eq!(blocks[0].header, "#   Spaced Title");
        assert_eq!(blocks[0].body, "body");
    }

    #[test]
    fn hash_lines_inside_code_fences_still_split() {
        let doc = "# Usage\n\n```bash\n# install deps\npip install x\n```\n\n## Next\n\ntext\n";
        let titles: Vec<_> = segment(doc).into_iter().map(|b| b.title).collect();
        assert_eq!(titles, vec!["Usage", "install deps", "Next"]);
    }

    #[test]
    fn unclosed_fence_does_not_swallow_later_headings() {
        let blocks = segment("# A\n\n```\nunclosed\n\n## B\n\nbody\n");
        let titles: Vec<_> = blocks.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
        assert_eq!(blocks[0].body, "```\nunclosed");
        assert_eq!(blocks[1].body, "body");
    }

    #[test]
    fn index_keeps_last_duplicate() {
        let index = build_target_index("# Notes\n\nfirst\n\n# Notes\n\nsecond\n\n# Other\n\nx\n");
        assert_eq!(index.len(), 2);
        assert_eq!(index["Notes"], TranslatedBlock::new("# Notes", "second"));
        assert_eq!(index["Other"].body, "x");
    }
}
