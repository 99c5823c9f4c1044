//! 翻译后端模块
//!
//! 翻译后端对核心流程来说只是一项能力：输入提示词，返回生成的文本。
//! 这里提供该能力的 trait 以及基于 HTTP 的实现（Gemini 与 OpenAI 兼容接口），
//! 内置速率限制与指数退避重试。

use crate::error::{Result, TranslationError};
use crate::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, GeminiContent,
    GeminiGenerationConfig, GeminiPart, GeminiRequest, GeminiResponse, ProviderKind, RetryConfig,
    TranslationConfig,
};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

/// 文本生成能力
///
/// 实现者负责自己的超时、重试与速率限制策略；调用方按文档顺序逐个等待结果。
#[async_trait]
pub trait TextProvider: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> Result<String>;
}

/// 速率限制器
///
/// 保证相邻两次请求之间至少间隔 `1 / requests_per_second` 秒。
pub struct RateLimiter {
    /// 请求最小间隔
    min_interval: Duration,
    /// 上一次放行的时间
    last: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// 创建新的速率限制器
    ///
    /// # 参数
    ///
    /// * `requests_per_second` - 每秒允许的最大请求数，非正数表示不限速
    ///
    /// # 示例
    ///
    /// ```rust
    /// use readme_translator::RateLimiter;
    ///
    /// let limiter = RateLimiter::new(2.0); // 每 500ms 最多一个请求
    /// ```
    pub fn new(requests_per_second: f64) -> Self {
        let min_interval = if requests_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / requests_per_second)
        } else {
            Duration::ZERO
        };

        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    /// 获取请求许可
    ///
    /// 在发起API请求前调用此方法，必要时等待到最小间隔结束。
    pub async fn acquire(&self) {
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// 错误是否值得重试：网络错误、429 与 5xx
pub fn is_retryable(error: &TranslationError) -> bool {
    match error {
        TranslationError::Http(_) => true,
        TranslationError::ApiError { code, .. } => *code == 429 || (500..600).contains(code),
        _ => false,
    }
}

/// 带指数退避的重试机制
///
/// 为API调用提供可靠的重试机制，在可重试的失败上按指数增长的延迟重试。
///
/// # 参数
///
/// * `operation` - 要执行的异步操作
/// * `config` - 重试配置
/// * `rate_limiter` - 速率限制器
///
/// # 返回
///
/// * `Ok(T)` - 操作成功的结果
/// * `Err(TranslationError)` - 不可重试的错误，或所有重试尝试失败后的最后一个错误
pub async fn retry_with_backoff<F, Fut, T>(
    mut operation: F,
    config: &RetryConfig,
    rate_limiter: &RateLimiter,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut delay = config.initial_delay_ms;
    let mut attempt = 0;

    loop {
        rate_limiter.acquire().await;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt >= config.max_retries || !is_retryable(&e) => return Err(e),
            Err(e) => {
                attempt += 1;
                warn!("第 {} 次请求失败: {}，{}ms 后重试", attempt, e, delay);
                sleep(Duration::from_millis(delay)).await;
                delay = std::cmp::min(
                    (delay as f64 * config.backoff_multiplier) as u64,
                    config.max_delay_ms,
                );
            }
        }
    }
}

/// 基于 HTTP 的文本生成服务
///
/// 根据 `provider` 使用 Gemini `generateContent` 或 OpenAI 兼容的
/// `chat/completions` 接口。
///
/// # 示例
///
/// ```rust,no_run
/// use readme_translator::{TextProvider, TranslationConfig, TranslationService};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let service = TranslationService::from_env(TranslationConfig::default())?;
///     let text = service.generate_text("Say hello").await?;
///     println!("{}", text);
///     Ok(())
/// }
/// ```
pub struct TranslationService {
    /// HTTP客户端，用于API调用
    client: Client,
    /// 速率限制器
    rate_limiter: RateLimiter,
    /// 重试配置
    retry: RetryConfig,
    /// 翻译配置
    config: TranslationConfig,
    api_key: String,
}

impl TranslationService {
    /// 创建新的服务实例
    pub fn new(config: TranslationConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TranslationError::Config(format!("无法创建 HTTP 客户端: {}", e)))?;

        Ok(Self {
            client,
            rate_limiter: RateLimiter::new(config.max_requests_per_second),
            retry: RetryConfig::default(),
            config,
            api_key: api_key.into(),
        })
    }

    /// 从配置指定的环境变量读取 API 密钥并创建实例
    pub fn from_env(config: TranslationConfig) -> Result<Self> {
        let key_env = config.api_key_env();
        let api_key = std::env::var(&key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| TranslationError::Config(format!("未设置环境变量 {}", key_env)))?;
        Self::new(config, api_key)
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        match self.config.provider {
            ProviderKind::Gemini => format!(
                "{}/models/{}:generateContent",
                self.config.base_url(),
                self.config.model
            ),
            ProviderKind::OpenAi => format!("{}/chat/completions", self.config.base_url()),
        }
    }

    async fn request_once(&self, prompt: &str) -> Result<String> {
        let url = self.endpoint();
        debug!("发送请求到: {}，提示词长度: {} 字符", url, prompt.chars().count());

        let request = match self.config.provider {
            ProviderKind::Gemini => {
                let body = GeminiRequest {
                    contents: vec![GeminiContent {
                        role: Some("user".to_string()),
                        parts: vec![GeminiPart {
                            text: prompt.to_string(),
                        }],
                    }],
                    generation_config: self
                        .config
                        .temperature
                        .map(|temperature| GeminiGenerationConfig { temperature }),
                };
                self.client
                    .post(&url)
                    .header("x-goog-api-key", &self.api_key)
                    .json(&body)
            }
            ProviderKind::OpenAi => {
                let body = ChatCompletionRequest {
                    model: self.config.model.clone(),
                    messages: vec![ChatMessage {
                        role: "user".to_string(),
                        content: Some(prompt.to_string()),
                    }],
                    temperature: self.config.temperature,
                };
                self.client
                    .post(&url)
                    .bearer_auth(&self.api_key)
                    .json(&body)
            }
        };

        let response = request.send().await?;
        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(TranslationError::ApiError {
                code: status.as_u16() as i32,
                message: format!("{} 请求失败: {}", self.config.model, response_text.trim()),
            });
        }

        match self.config.provider {
            ProviderKind::Gemini => extract_gemini_text(&response_text),
            ProviderKind::OpenAi => extract_chat_text(&response_text),
        }
    }
}

#[async_trait]
impl TextProvider for TranslationService {
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        retry_with_backoff(
            || self.request_once(prompt),
            &self.retry,
            &self.rate_limiter,
        )
        .await
    }
}

/// 从 Gemini 响应中取出生成的文本（拼接首个候选的所有 part）
pub fn extract_gemini_text(response_text: &str) -> Result<String> {
    let response: GeminiResponse = serde_json::from_str(response_text)
        .map_err(|e| TranslationError::ParseError(format!("无法解析 Gemini 响应: {}", e)))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        Err(TranslationError::Custom("API返回了空的生成结果".to_string()))
    } else {
        Ok(text)
    }
}

/// 从 OpenAI 兼容响应中取出首个选项的文本
pub fn extract_chat_text(response_text: &str) -> Result<String> {
    let response: ChatCompletionResponse = serde_json::from_str(response_text)
        .map_err(|e| TranslationError::ParseError(format!("无法解析 chat 响应: {}", e)))?;

    match response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
    {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(TranslationError::Custom("API返回了空的生成结果".to_string())),
    }
}

/// 按配置创建文本生成后端，缺少 API 密钥时返回配置错误
pub fn create_text_provider(config: &TranslationConfig) -> Result<TranslationService> {
    let service = TranslationService::from_env(config.clone())?;
    info!("使用模型: {} ({:?})", service.model(), config.provider);
    Ok(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_retry(max_retries: usize) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_delay_ms: 1,
            max_delay_ms: 2,
            backoff_multiplier: 2.0,
        }
    }

    #[test]
    fn extracts_gemini_candidate_text() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello "},{"text":"world"}]}}]}"#;
        assert_eq!(extract_gemini_text(body).unwrap(), "Hello world");

        assert!(extract_gemini_text(r#"{"candidates":[]}"#).is_err());
        assert!(matches!(
            extract_gemini_text("not json"),
            Err(TranslationError::ParseError(_))
        ));
    }

    #[test]
    fn extracts_chat_choice_text() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Features"}}]}"#;
        assert_eq!(extract_chat_text(body).unwrap(), "Features");
        assert!(extract_chat_text(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#).is_err());
    }

    #[test]
    fn endpoint_follows_provider() {
        let gemini = TranslationService::new(TranslationConfig::default(), "k").unwrap();
        assert_eq!(
            gemini.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-flash-preview:generateContent"
        );

        let openai = TranslationService::new(
            TranslationConfig {
                provider: ProviderKind::OpenAi,
                api_base_url: Some("http://localhost:1234/v1/".to_string()),
                ..TranslationConfig::default()
            },
            "k",
        )
        .unwrap();
        assert_eq!(openai.endpoint(), "http://localhost:1234/v1/chat/completions");
    }

    #[test]
    fn missing_api_key_is_config_error() {
        let config = TranslationConfig {
            api_key_env: Some("READMETRANSLATOR_TEST_UNSET_KEY".to_string()),
            ..TranslationConfig::default()
        };
        let err = create_text_provider(&config).err().unwrap();
        assert!(err.is_setup_error());
    }

    #[test]
    fn retryable_errors() {
        assert!(is_retryable(&TranslationError::ApiError { code: 429, message: String::new() }));
        assert!(is_retryable(&TranslationError::ApiError { code: 503, message: String::new() }));
        assert!(!is_retryable(&TranslationError::ApiError { code: 400, message: String::new() }));
        assert!(!is_retryable(&TranslationError::ParseError("x".into())));
    }

    #[test]
    fn retry_stops_after_success() {
        let calls = AtomicUsize::new(0);
        let limiter = RateLimiter::new(0.0);
        let result = tokio_test::block_on(retry_with_backoff(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(TranslationError::ApiError { code: 500, message: "busy".into() })
                    } else {
                        Ok(n)
                    }
                }
            },
            &fast_retry(3),
            &limiter,
        ));
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn retry_gives_up_on_non_retryable_error() {
        let calls = AtomicUsize::new(0);
        let limiter = RateLimiter::new(0.0);
        let result: Result<()> = tokio_test::block_on(retry_with_backoff(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TranslationError::ApiError { code: 401, message: "bad key".into() }) }
            },
            &fast_retry(3),
            &limiter,
        ));
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
