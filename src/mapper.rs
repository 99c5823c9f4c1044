//! 修改块映射模块
//!
//! 把修改行号与各个块占据的行范围求交，得到需要重新翻译的块标题。

use crate::segmenter::segment;
use crate::types::{Block, ChangedLines, LineSpan};
use log::info;
use std::collections::HashSet;

/// 根据修改的行号，找出哪些块被修改了
///
/// `changed_lines` 为空时直接返回空集合。这与“所有块都被修改”不同，
/// 调用方需要在更高一层决定是否全文翻译。
///
/// 按文档顺序遍历块，维护一个从 1 开始的行游标；每个块占据其原始行范围
/// 的长度，与 `changed_lines` 有交集时记录其标题，无论是否命中游标都前进。
pub fn map_changes(document: &str, changed_lines: &ChangedLines) -> HashSet<String> {
    if changed_lines.is_empty() {
        info!("没有检测到具体的修改行");
        return HashSet::new();
    }

    changed_titles(&segment(document), changed_lines)
}

/// 在已切分好的块上求交
pub fn changed_titles(blocks: &[Block], changed_lines: &ChangedLines) -> HashSet<String> {
    let mut changed = HashSet::new();
    if changed_lines.is_empty() {
        return changed;
    }

    let mut cursor = 1;
    for block in blocks {
        // 标题之前被丢弃的空白行不属于任何块
        cursor = cursor.max(block.span.start);
        let walked = LineSpan::new(cursor, cursor + block.span.len() - 1);

        if walked.intersects(changed_lines) {
            info!("检测到修改的块: {}", display_title(&block.title));
            changed.insert(block.title.clone());
        }

        cursor = walked.end + 1;
    }

    changed
}

pub(crate) fn display_title(title: &str) -> &str {
    if title.is_empty() {
        "(前置内容)"
    } else {
        title
    }
}
