//! 翻译提示词
//!
//! 固定的指令模板：保持 Markdown 结构、HTML 标签、URL 与徽章链接不变，
//! 技术术语使用目标语言的常见表达，只输出译文。

const CONTENT_MARKER: &str = "Original content:\n\n";
const ANSWER_MARKER: &str = "\n\nTranslated ";

/// 构造单个内容块的翻译提示词
pub fn build_translation_prompt(content: &str, source_lang: &str, target_lang: &str) -> String {
    format!(
        "Please translate the following {source_lang} Markdown content to {target_lang}.

Requirements:
1. Keep Markdown format unchanged (headings, links, images, code blocks, etc.)
2. Keep all HTML tags and attributes unchanged
3. Keep all URLs unchanged
4. Keep all badges links and format unchanged
5. Use common {target_lang} expressions for technical terms
6. Professional, clear, and readable style
7. Keep original paragraph structure and layout
8. Output ONLY the translated content without any extra explanations

{CONTENT_MARKER}{content}{ANSWER_MARKER}{target_lang} version:"
    )
}

/// 从提示词中取回待翻译的原文，主要供测试替身使用
pub fn extract_source_text(prompt: &str) -> Option<&str> {
    let start = prompt.find(CONTENT_MARKER)? + CONTENT_MARKER.len();
    let end = prompt.rfind(ANSWER_MARKER)?;
    prompt.get(start..end)
}
