//! 错误处理模块
//!
//! 定义增量翻译流程中使用的错误类型。
//!
//! 只有获取 diff 的步骤会在本地吸收错误（降级为全文翻译），
//! 其余错误一律向上传播并终止本次运行。

use std::path::PathBuf;
use thiserror::Error;

/// 翻译错误类型
///
/// 包含增量翻译过程中可能出现的各种错误情况。
///
/// # 变体说明
///
/// * `Http` - HTTP请求错误
/// * `Custom` - 自定义错误消息
/// * `ApiError` - API响应错误，包含错误代码和消息
/// * `ParseError` - 解析错误
/// * `Io` - 文件读写错误
/// * `SourceMissing` / `SourceEmpty` - 源文档不可用
/// * `Config` - 配置或后端初始化错误
/// * `Diff` - 版本控制 diff 获取或解析失败
#[derive(Debug, Error)]
pub enum TranslationError {
    /// HTTP请求错误
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// 自定义错误消息
    #[error("{0}")]
    Custom(String),
    /// API响应错误
    #[error("API error {code}: {message}")]
    ApiError {
        /// 错误代码
        code: i32,
        /// 错误消息
        message: String,
    },
    /// 解析错误
    #[error("Parse error: {0}")]
    ParseError(String),
    /// 文件读写错误
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// 源文件不存在
    #[error("source file does not exist: {}", .0.display())]
    SourceMissing(PathBuf),
    /// 源文件为空
    #[error("source file is empty: {}", .0.display())]
    SourceEmpty(PathBuf),
    /// 配置错误（包括翻译后端初始化失败）
    #[error("Configuration error: {0}")]
    Config(String),
    /// diff 获取或解析失败
    #[error("Diff error: {0}")]
    Diff(String),
}

impl From<String> for TranslationError {
    fn from(error: String) -> Self {
        TranslationError::Custom(error)
    }
}

impl From<&str> for TranslationError {
    fn from(error: &str) -> Self {
        TranslationError::Custom(error.to_string())
    }
}

impl TranslationError {
    /// 是否属于配置/IO类致命错误（源文件缺失、为空或后端初始化失败）
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            TranslationError::SourceMissing(_)
                | TranslationError::SourceEmpty(_)
                | TranslationError::Config(_)
        )
    }
}

/// 翻译结果类型别名
///
/// 简化返回类型，使用 `TranslationError` 作为错误类型。
///
/// # 示例
///
/// ```rust
/// use readme_translator::{Result, TranslationError};
///
/// fn example_function() -> Result<String> {
///     Err(TranslationError::Custom("boom".to_string()))
/// }
///
/// assert!(example_function().is_err());
/// ```
pub type Result<T> = std::result::Result<T, TranslationError>;
