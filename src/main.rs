use anyhow::Context;
use clap::Parser;
use log::{error, info};
use std::path::{Path, PathBuf};

use readme_translator::{
    create_text_provider, find_project_root, load_documents, GitCli, IncrementalTranslator,
    TranslationError, TranslatorConfig,
};

/// 基于 diff 的增量翻译：README.md -> README_EN.md
///
/// 只重新翻译自上次提交以来修改过的章节，其余章节复用现有译文。
#[derive(Parser, Debug)]
#[command(name = "readme-translator", version, about)]
struct Cli {
    /// 强制全文翻译，忽略现有译文与 git diff
    #[arg(long)]
    full: bool,
}

/// 项目根目录：从可执行文件所在目录向上查找，找不到时使用当前工作目录
fn project_root() -> anyhow::Result<PathBuf> {
    let from_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().and_then(find_project_root));
    match from_exe {
        Some(root) => Ok(root),
        None => std::env::current_dir().context("无法确定当前工作目录"),
    }
}

async fn run(root: &Path, force_full: bool) -> anyhow::Result<()> {
    let config = TranslatorConfig::load_from_default_locations(root);
    let source_path = config.source_path(root);
    let target_path = config.target_path(root);

    info!("源文件: {}", source_path.display());
    info!("目标文件: {}", target_path.display());

    let docs = load_documents(&source_path, &target_path, force_full)?;

    info!("初始化AI文本提供者...");
    let provider = create_text_provider(&config.translation)?;

    let translator = IncrementalTranslator::new(config, provider, GitCli::default());
    translator
        .run_with_documents(&docs, force_full)
        .await
        .with_context(|| format!("翻译 {} 失败", docs.target_path.display()))?;
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let root = match project_root() {
        Ok(root) => root,
        Err(err) => {
            error!("{:?}", err);
            std::process::exit(1);
        }
    };

    info!("README 增量翻译工具");
    info!("项目根目录: {}", root.display());
    if cli.full {
        info!("模式: 强制全文翻译");
    } else {
        info!("模式: 增量翻译（仅翻译修改的部分）");
    }

    if let Err(err) = run(&root, cli.full).await {
        match err.downcast_ref::<TranslationError>() {
            Some(setup) if setup.is_setup_error() => error!("{}", setup),
            _ => error!("翻译失败: {:?}", err),
        }
        std::process::exit(1);
    }
}
