//! 配置管理模块
//!
//! 提供TOML配置文件的读取、写入和自动发现功能。

use crate::error::{Result, TranslationError};
use crate::types::{DocumentConfig, ProviderKind, TranslationConfig};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 覆盖模型标识的环境变量
pub const TEXT_MODEL_ENV: &str = "TEXT_MODEL";

/// 在项目根目录下依次查找的配置文件名
pub const CONFIG_FILE_NAMES: [&str; 3] = [
    "translation-config.toml",
    "config.toml",
    ".translation-config.toml",
];

/// 从 `start` 开始逐级向上查找项目根目录
///
/// 第一个包含任一配置文件或默认源文档的目录即为根目录。
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let source_file = DocumentConfig::default().source_file;
    start
        .ancestors()
        .find(|dir| {
            CONFIG_FILE_NAMES
                .iter()
                .copied()
                .chain(std::iter::once(source_file.as_str()))
                .any(|name| dir.join(name).is_file())
        })
        .map(Path::to_path_buf)
}

/// 增量翻译工具配置
///
/// 包含翻译后端配置与文档路径配置，支持从TOML文件加载和保存。
///
/// # 示例
///
/// ```rust,no_run
/// use readme_translator::TranslatorConfig;
///
/// // 从项目根目录的默认位置加载配置
/// let config = TranslatorConfig::load_from_default_locations(".");
///
/// // 从指定文件加载配置
/// let config = TranslatorConfig::from_file("config.toml").unwrap();
///
/// // 保存配置到文件
/// config.save_to_file("output.toml").unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslatorConfig {
    /// 翻译配置
    #[serde(default)]
    pub translation: TranslationConfig,
    /// 文档配置
    #[serde(default)]
    pub documents: DocumentConfig,
}

impl TranslatorConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| TranslationError::Config(e.to_string()))
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| TranslationError::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from the well-known file names under `root`,
    /// then apply the `TEXT_MODEL` override
    pub fn load_from_default_locations<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        let mut config = Self::find_config_file(root)
            .and_then(|path| match Self::from_file(&path) {
                Ok(config) => {
                    info!("已加载配置文件: {}", path.display());
                    Some(config)
                }
                Err(e) => {
                    warn!("加载配置文件 {} 失败: {}，使用默认配置", path.display(), e);
                    None
                }
            })
            .unwrap_or_default();

        config.apply_model_override(std::env::var(TEXT_MODEL_ENV).ok());
        config
    }

    fn find_config_file(root: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| root.join(name))
            .find(|path| path.exists())
    }

    /// 用外部提供的模型标识覆盖配置；模型名能识别出后端类型时一并切换
    pub fn apply_model_override(&mut self, model: Option<String>) {
        let Some(model) = model.map(|m| m.trim().to_string()).filter(|m| !m.is_empty()) else {
            return;
        };
        if let Some(kind) = ProviderKind::from_model(&model) {
            self.translation.provider = kind;
        }
        self.translation.model = model;
    }

    pub fn source_path(&self, root: &Path) -> PathBuf {
        root.join(&self.documents.source_file)
    }

    pub fn target_path(&self, root: &Path) -> PathBuf {
        root.join(&self.documents.target_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_TEXT_MODEL;

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config = TranslatorConfig::from_toml_str(
            r#"
[translation]
model = "gpt-4o-mini"
provider = "openai"

[documents]
target_file = "docs/README_EN.md"
"#,
        )
        .unwrap();

        assert_eq!(config.translation.provider, ProviderKind::OpenAi);
        assert_eq!(config.translation.model, "gpt-4o-mini");
        assert_eq!(config.translation.target_lang, "English");
        assert_eq!(config.documents.source_file, "README.md");
        assert_eq!(config.documents.target_file, "docs/README_EN.md");
        assert_eq!(config.documents.link_rewrites.len(), 2);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = TranslatorConfig::from_toml_str("[translation\nmodel=").unwrap_err();
        assert!(matches!(err, TranslationError::Config(_)));
    }

    #[test]
    fn model_override_switches_provider_when_recognized() {
        let mut config = TranslatorConfig::default();
        assert_eq!(config.translation.model, DEFAULT_TEXT_MODEL);

        config.apply_model_override(Some("gpt-4o".to_string()));
        assert_eq!(config.translation.model, "gpt-4o");
        assert_eq!(config.translation.provider, ProviderKind::OpenAi);

        config.apply_model_override(Some("local-model".to_string()));
        assert_eq!(config.translation.model, "local-model");
        assert_eq!(config.translation.provider, ProviderKind::OpenAi);

        config.apply_model_override(Some("  ".to_string()));
        assert_eq!(config.translation.model, "local-model");
    }

    #[test]
    fn save_and_reload_from_default_location() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = TranslatorConfig::default();
        config.documents.source_file = "README_zh.md".to_string();
        config.save_to_file(dir.path().join("translation-config.toml")).unwrap();

        let loaded = TranslatorConfig::find_config_file(dir.path())
            .map(TranslatorConfig::from_file)
            .unwrap()
            .unwrap();
        assert_eq!(loaded.documents.source_file, "README_zh.md");
        assert_eq!(loaded.source_path(dir.path()), dir.path().join("README_zh.md"));
    }

    #[test]
    fn project_root_is_found_above_binary_directory() {
        let dir = tempfile::tempdir().unwrap();
        let bin_dir = dir.path().join("target").join("release");
        fs::create_dir_all(&bin_dir).unwrap();

        fs::write(dir.path().join("README.md"), "# Title\n").unwrap();
        assert_eq!(find_project_root(&bin_dir), Some(dir.path().to_path_buf()));

        let nested = dir.path().join("docs");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("translation-config.toml"), "").unwrap();
        assert_eq!(find_project_root(&nested), Some(nested.clone()));
    }
}
