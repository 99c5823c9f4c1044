//! 块协调模块
//!
//! 对源文档的每个块决定“重新翻译”还是“复用已有译文”，
//! 然后按源文档顺序组装最终文档。

use crate::error::Result;
use crate::mapper::display_title;
use crate::prompt::build_translation_prompt;
use crate::translator::TextProvider;
use crate::types::{
    Block, LinkRewrite, Reconciliation, TargetBlockIndex, TranslatedBlock, TranslationConfig,
};
use log::{info, warn};
use std::collections::HashSet;

/// 判断一个块是否需要翻译
///
/// 以下任一条件成立即需要翻译：强制全文翻译、没有修改行信息、
/// 已有译文中没有该标题、该标题在修改块集合中。
pub fn needs_translation(
    title: &str,
    target_index: &TargetBlockIndex,
    changed_titles: &HashSet<String>,
    changed_lines_available: bool,
    force_full: bool,
) -> bool {
    force_full
        || !changed_lines_available
        || !target_index.contains_key(title)
        || changed_titles.contains(title)
}

pub struct Reconciler<'a> {
    provider: &'a dyn TextProvider,
    source_lang: String,
    target_lang: String,
}

impl<'a> Reconciler<'a> {
    pub fn new(provider: &'a dyn TextProvider, config: &TranslationConfig) -> Self {
        Self {
            provider,
            source_lang: config.source_lang.clone(),
            target_lang: config.target_lang.clone(),
        }
    }

    /// 翻译一段文本；空文本直接返回空串，不调用后端
    pub async fn translate_text(&self, text: &str) -> Result<String> {
        if text.is_empty() {
            return Ok(String::new());
        }
        let prompt = build_translation_prompt(text, &self.source_lang, &self.target_lang);
        let translated = self.provider.generate_text(&prompt).await?;
        Ok(translated.trim().to_string())
    }

    /// 标题行与正文分别翻译
    async fn translate_block(&self, block: &Block) -> Result<TranslatedBlock> {
        let header = self.translate_text(&block.header).await?;
        let body = self.translate_text(&block.body).await?;
        Ok(TranslatedBlock { header, body })
    }

    /// 逐块协调
    ///
    /// 返回与 `source_blocks` 一一对应、顺序相同的译文块，以及实际送去翻译的块数。
    /// 块按文档顺序逐个处理，每次翻译都等待后端返回后才继续。
    pub async fn reconcile(
        &self,
        source_blocks: &[Block],
        target_index: &TargetBlockIndex,
        changed_titles: &HashSet<String>,
        changed_lines_available: bool,
        force_full: bool,
    ) -> Result<Reconciliation> {
        let total = source_blocks.len();
        let mut result = Reconciliation {
            blocks: Vec::with_capacity(total),
            translated_count: 0,
        };

        for (idx, block) in source_blocks.iter().enumerate() {
            let title = display_title(&block.title);
            let translate = needs_translation(
                &block.title,
                target_index,
                changed_titles,
                changed_lines_available,
                force_full,
            );

            let reused = if translate {
                None
            } else {
                match target_index.get(&block.title) {
                    Some(existing) => Some(existing.clone()),
                    None => {
                        warn!("未找到现有翻译，将翻译: {}", title);
                        None
                    }
                }
            };

            match reused {
                Some(existing) => {
                    info!("[{}/{}] 复用现有翻译: {}", idx + 1, total, title);
                    result.blocks.push(existing);
                }
                None => {
                    info!("[{}/{}] 翻译块: {}", idx + 1, total, title);
                    result.blocks.push(self.translate_block(block).await?);
                    result.translated_count += 1;
                }
            }
        }

        Ok(result)
    }
}

/// 依次应用字面量替换规则
pub fn apply_link_rewrites(text: &str, rewrites: &[LinkRewrite]) -> String {
    rewrites
        .iter()
        .filter(|rule| !rule.from.is_empty())
        .fold(text.to_string(), |acc, rule| acc.replace(&rule.from, &rule.to))
}

/// 组装最终内容
///
/// 每个块的标题行（非空时）和正文（非空时）各自后接一个空行，
/// 然后应用链接替换，去掉首尾空白并以恰好一个换行结尾。
pub fn assemble(blocks: &[TranslatedBlock], rewrites: &[LinkRewrite]) -> String {
    let mut content = String::new();
    for block in blocks {
        for part in [&block.header, &block.body] {
            if !part.is_empty() {
                content.push_str(part);
                content.push_str("\n\n");
            }
        }
    }

    let content = apply_link_rewrites(&content, rewrites);
    format!("{}\n", content.trim())
}
