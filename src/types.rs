//! 类型定义模块
//!
//! 定义增量翻译中使用的数据结构、配置类型以及翻译后端的请求/响应格式。

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// 默认文本生成模型
pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-flash-preview";

/// 翻译后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Gemini `generateContent` 接口
    #[default]
    Gemini,
    /// OpenAI 兼容的 `chat/completions` 接口
    OpenAi,
}

impl ProviderKind {
    /// 根据模型名推断后端类型，无法识别时返回 `None`
    pub fn from_model(model: &str) -> Option<Self> {
        let model = model.trim().to_ascii_lowercase();
        if model.starts_with("gemini") {
            Some(ProviderKind::Gemini)
        } else if model.starts_with("gpt-")
            || model.starts_with("o1")
            || model.starts_with("o3")
            || model.starts_with("o4")
        {
            Some(ProviderKind::OpenAi)
        } else {
            None
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            ProviderKind::OpenAi => "https://api.openai.com/v1",
        }
    }

    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "GEMINI_API_KEY",
            ProviderKind::OpenAi => "OPENAI_API_KEY",
        }
    }
}

/// 翻译配置
///
/// 包含翻译后端的所有配置选项，如模型、API地址、语言设置、性能参数等。
///
/// # 字段说明
///
/// * `provider` - 翻译后端类型
/// * `model` - 文本生成模型标识，可被 `TEXT_MODEL` 环境变量覆盖
/// * `api_base_url` - API 基础地址，缺省时使用后端默认地址
/// * `api_key_env` - 读取 API 密钥的环境变量名
/// * `source_lang` - 源语言名称（写入提示词）
/// * `target_lang` - 目标语言名称（写入提示词）
/// * `max_requests_per_second` - 每秒最大请求数
/// * `timeout_secs` - 单次请求超时（秒）
/// * `temperature` - 生成温度
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// 翻译后端类型
    pub provider: ProviderKind,
    /// 文本生成模型标识
    pub model: String,
    /// API 基础地址
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    /// 读取 API 密钥的环境变量名
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// 源语言名称
    pub source_lang: String,
    /// 目标语言名称
    pub target_lang: String,
    /// 每秒最大请求数
    pub max_requests_per_second: f64,
    /// 单次请求超时（秒）
    pub timeout_secs: u64,
    /// 生成温度
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Gemini,
            model: DEFAULT_TEXT_MODEL.to_string(),
            api_base_url: None,
            api_key_env: None,
            source_lang: "Chinese".to_string(),
            target_lang: "English".to_string(),
            max_requests_per_second: 1.0,
            timeout_secs: 120,
            temperature: None,
        }
    }
}

impl TranslationConfig {
    pub fn base_url(&self) -> String {
        self.api_base_url
            .clone()
            .unwrap_or_else(|| self.provider.default_base_url().to_string())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn api_key_env(&self) -> String {
        self.api_key_env
            .clone()
            .unwrap_or_else(|| self.provider.default_api_key_env().to_string())
    }
}

/// 字面量链接替换规则，用于在组装后把中英文导航链接互换
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRewrite {
    pub from: String,
    pub to: String,
}

impl LinkRewrite {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// 默认的导航链接替换规则
pub fn default_link_rewrites() -> Vec<LinkRewrite> {
    vec![
        LinkRewrite::new(
            "**中文 | [English](README_EN.md)**",
            "**[中文](README.md) | English**",
        ),
        LinkRewrite::new(
            "**Chinese | [English](README_EN.md)**",
            "**[中文](README.md) | English**",
        ),
    ]
}

/// 文档配置
///
/// 源文档与目标文档的路径（相对项目根目录）以及组装后的链接替换规则。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// 源文档
    pub source_file: String,
    /// 目标文档
    pub target_file: String,
    /// 导航链接替换规则
    pub link_rewrites: Vec<LinkRewrite>,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            source_file: "README.md".to_string(),
            target_file: "README_EN.md".to_string(),
            link_rewrites: default_link_rewrites(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 500,
            max_delay_ms: 5000,
            backoff_multiplier: 2.0,
        }
    }
}

/// 块在原始文档中占据的行范围（从 1 开始，闭区间）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub start: usize,
    pub end: usize,
}

impl LineSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// 占据的行数，至少为 1
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// 是否与修改行集合有交集
    pub fn intersects(&self, lines: &ChangedLines) -> bool {
        lines.range(self.start..=self.end).next().is_some()
    }
}

/// 按标题切分出的文档块
///
/// `header` 为完整标题行（如 `## 功能特性`），`title` 为标题文本，
/// `body` 为标题下的内容（去掉首尾空行）。首个块在标题之前有内容时
/// `header` 与 `title` 为空。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub header: String,
    pub title: String,
    pub body: String,
    /// 在原始文档中的行范围
    pub span: LineSpan,
}

/// 块的译文（新翻译的或从已有译文中复用的）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TranslatedBlock {
    pub header: String,
    pub body: String,
}

impl TranslatedBlock {
    pub fn new(header: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            body: body.into(),
        }
    }
}

/// 源文档当前版本中新增或修改的行号（从 1 开始）。
///
/// 空集合表示“未知”，调用方应当按全文翻译处理。
pub type ChangedLines = BTreeSet<usize>;

/// 标题 -> 已有译文，重复标题以最后一次出现为准
pub type TargetBlockIndex = HashMap<String, TranslatedBlock>;

/// 一次协调的结果
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// 与源文档块一一对应、顺序相同的译文块
    pub blocks: Vec<TranslatedBlock>,
    /// 实际送去翻译的块数
    pub translated_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiGenerationConfig {
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    pub content: Option<GeminiContent>,
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_span_intersection() {
        let span = LineSpan::new(5, 8);
        assert_eq!(span.len(), 4);
        assert!(span.intersects(&[5].into_iter().collect()));
        assert!(span.intersects(&[8].into_iter().collect()));
        assert!(!span.intersects(&[4, 9].into_iter().collect()));

        let lines: ChangedLines = [1, 2, 9].into_iter().collect();
        assert!(!span.intersects(&lines));
        let lines: ChangedLines = [1, 7].into_iter().collect();
        assert!(span.intersects(&lines));
    }

    #[test]
    fn provider_inferred_from_model_name() {
        assert_eq!(ProviderKind::from_model("gemini-3-flash-preview"), Some(ProviderKind::Gemini));
        assert_eq!(ProviderKind::from_model("gpt-4o-mini"), Some(ProviderKind::OpenAi));
        assert_eq!(ProviderKind::from_model("qwen2.5"), None);
    }

    #[test]
    fn base_url_strips_trailing_slash() {
        let config = TranslationConfig {
            api_base_url: Some("http://localhost:8080/v1/".to_string()),
            ..TranslationConfig::default()
        };
        assert_eq!(config.base_url(), "http://localhost:8080/v1");
        assert_eq!(config.api_key_env(), "GEMINI_API_KEY");
    }
}
