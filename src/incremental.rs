//! 增量翻译流程
//!
//! 读取源文档与已有译文 → 定位修改行 → 映射到修改块 → 逐块协调 → 组装 → 一次性写出。
//! 两次读取都发生在任何翻译调用之前，写出只在全部块协调成功之后发生一次。

use crate::config::TranslatorConfig;
use crate::diff::{locate_changes, VersionControl};
use crate::error::{Result, TranslationError};
use crate::mapper::map_changes;
use crate::reconciler::{assemble, Reconciler};
use crate::segmenter::{build_target_index, segment};
use crate::translator::TextProvider;
use crate::types::ChangedLines;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// 一次运行所需的两份文档
#[derive(Debug, Clone)]
pub struct Documents {
    pub source_path: PathBuf,
    pub target_path: PathBuf,
    pub source: String,
    /// 已有译文；不存在、为空或强制全文翻译时为 `None`
    pub target: Option<String>,
}

/// 读取源文档与已有译文
///
/// 源文档不存在或内容为空时返回错误。已有译文只在存在且不强制全文翻译时读取。
pub fn load_documents(source_path: &Path, target_path: &Path, force_full: bool) -> Result<Documents> {
    if !source_path.exists() {
        return Err(TranslationError::SourceMissing(source_path.to_path_buf()));
    }

    info!("读取源文件: {}", source_path.display());
    let source = fs::read_to_string(source_path)?;
    if source.trim().is_empty() {
        return Err(TranslationError::SourceEmpty(source_path.to_path_buf()));
    }

    let target = if target_path.exists() && !force_full {
        info!("读取现有译文: {}", target_path.display());
        Some(fs::read_to_string(target_path)?).filter(|t| !t.trim().is_empty())
    } else {
        None
    };

    Ok(Documents {
        source_path: source_path.to_path_buf(),
        target_path: target_path.to_path_buf(),
        source,
        target,
    })
}

/// 一次运行的结果
#[derive(Debug, Clone)]
pub struct TranslationOutcome {
    /// 组装好的目标文档
    pub content: String,
    pub total_blocks: usize,
    pub translated_blocks: usize,
    /// 是否走了全文翻译
    pub full_translation: bool,
}

pub struct IncrementalTranslator<P, V> {
    config: TranslatorConfig,
    provider: P,
    vcs: V,
}

impl<P: TextProvider, V: VersionControl> IncrementalTranslator<P, V> {
    pub fn new(config: TranslatorConfig, provider: P, vcs: V) -> Self {
        Self {
            config,
            provider,
            vcs,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// 在内存中完成翻译与组装，不写文件
    pub async fn translate(&self, docs: &Documents, force_full: bool) -> Result<TranslationOutcome> {
        let target_index = docs
            .target
            .as_deref()
            .map(build_target_index)
            .unwrap_or_default();

        let changed_lines = if force_full {
            ChangedLines::new()
        } else {
            locate_changes(&self.vcs, &docs.source_path)
        };

        let source_blocks = segment(&docs.source);
        let changed_titles = map_changes(&docs.source, &changed_lines);
        let changed_lines_available = !changed_lines.is_empty();

        let full_translation = docs.target.is_none() || force_full || !changed_lines_available;
        if full_translation {
            info!("执行全文翻译");
        } else {
            info!(
                "增量翻译：{} 个修改块，共 {} 个块",
                changed_titles.len(),
                source_blocks.len()
            );
        }

        let reconciler = Reconciler::new(&self.provider, &self.config.translation);
        let reconciliation = reconciler
            .reconcile(
                &source_blocks,
                &target_index,
                &changed_titles,
                changed_lines_available,
                full_translation,
            )
            .await?;

        Ok(TranslationOutcome {
            content: assemble(&reconciliation.blocks, &self.config.documents.link_rewrites),
            total_blocks: source_blocks.len(),
            translated_blocks: reconciliation.translated_count,
            full_translation,
        })
    }

    /// 读取、翻译并覆盖写出目标文档
    pub async fn run(&self, root: &Path, force_full: bool) -> Result<TranslationOutcome> {
        let docs = load_documents(
            &self.config.source_path(root),
            &self.config.target_path(root),
            force_full,
        )?;
        self.run_with_documents(&docs, force_full).await
    }

    /// 翻译已读入的文档并覆盖写出，翻译失败时不写文件
    pub async fn run_with_documents(
        &self,
        docs: &Documents,
        force_full: bool,
    ) -> Result<TranslationOutcome> {
        let outcome = self.translate(docs, force_full).await?;
        write_output(&docs.target_path, &outcome)?;
        Ok(outcome)
    }
}

/// 整体覆盖写出目标文档
pub fn write_output(target_path: &Path, outcome: &TranslationOutcome) -> Result<()> {
    info!("写入目标文件: {}", target_path.display());
    fs::write(target_path, &outcome.content)?;
    info!(
        "翻译完成！共处理 {} 个块，翻译了 {} 个块",
        outcome.total_blocks, outcome.translated_blocks
    );
    Ok(())
}
