//! # README Translator
//!
//! 基于 diff 的 Markdown 文档增量翻译库：只重新翻译自上次提交以来发生变化的章节，
//! 其余章节原样复用已有译文。
//!
//! ## 工作流程
//!
//! 1. **分块**：按 `#` 到 `####` 标题把源文档和已有译文切分为有序的块
//! 2. **定位修改行**：`git diff -U0 HEAD` 给出源文档中新增或修改的行号
//! 3. **映射修改块**：把修改行与各块的行范围求交，得到需要重新翻译的标题
//! 4. **协调**：逐块决定翻译或复用，翻译交给外部文本生成服务
//! 5. **组装**：按源文档顺序拼接，修正中英文导航链接后一次性写出
//!
//! 拿不到修改信息（没有提交历史、git 不可用、diff 为空）时一律全文翻译。
//!
//! ## 快速开始
//!
//! ```rust,no_run
//! use readme_translator::{
//!     create_text_provider, GitCli, IncrementalTranslator, TranslatorConfig,
//! };
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let root = Path::new(".");
//!     let config = TranslatorConfig::load_from_default_locations(root);
//!     let provider = create_text_provider(&config.translation)?;
//!
//!     let translator = IncrementalTranslator::new(config, provider, GitCli::default());
//!     let outcome = translator.run(root, false).await?;
//!     println!("translated {} of {} blocks", outcome.translated_blocks, outcome.total_blocks);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## 配置文件支持
//!
//! ```toml
//! [translation]
//! provider = "gemini"
//! model = "gemini-3-flash-preview"
//! source_lang = "Chinese"
//! target_lang = "English"
//! max_requests_per_second = 1.0
//! timeout_secs = 120
//!
//! [documents]
//! source_file = "README.md"
//! target_file = "README_EN.md"
//! ```

pub mod config;
pub mod diff;
pub mod error;
pub mod incremental;
pub mod mapper;
pub mod mock;
pub mod prompt;
pub mod reconciler;
pub mod segmenter;
pub mod translator;
pub mod types;

pub use config::{find_project_root, TranslatorConfig};
pub use diff::{locate_changes, GitCli, VersionControl};
pub use error::{Result, TranslationError};
pub use incremental::{load_documents, write_output, Documents, IncrementalTranslator, TranslationOutcome};
pub use mapper::map_changes;
pub use reconciler::{assemble, needs_translation, Reconciler};
pub use segmenter::{build_target_index, segment};
pub use translator::{
    create_text_provider, retry_with_backoff, RateLimiter, TextProvider, TranslationService,
};
pub use types::{
    Block, ChangedLines, DocumentConfig, LineSpan, LinkRewrite, ProviderKind, Reconciliation,
    RetryConfig, TargetBlockIndex, TranslatedBlock, TranslationConfig,
};
