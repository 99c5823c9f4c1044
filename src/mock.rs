//! 模拟文本提供者模块
//!
//! `MockProvider` 不访问网络：从翻译提示词中取回源文本，返回确定性的“译文”，
//! 并记录收到的每条提示词，供测试检查调用顺序与次数。

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::{Result, TranslationError};
use crate::prompt::extract_source_text;
use crate::translator::TextProvider;

/// 模拟提供者的行为模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    /// 在源文本前加标签，前后带空白，由调用方裁剪
    Tagged,
    /// 第 N 次调用（从 1 开始）失败，其余成功
    FailOnCall(usize),
}

#[derive(Debug)]
pub struct MockProvider {
    behavior: MockBehavior,
    tag: String,
    prompts: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            tag: "[EN]".to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// 返回 `"[EN] <源文本>"`
    pub fn working() -> Self {
        Self::new(MockBehavior::Tagged)
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// `working()` 对 `source` 给出的译文
    pub fn expected(&self, source: &str) -> String {
        format!("{} {}", self.tag, source)
    }

    /// 已收到的全部提示词，按调用顺序
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// 从已收到的提示词中提取的源文本，按调用顺序
    pub fn sources(&self) -> Vec<String> {
        self.prompts()
            .iter()
            .map(|p| extract_source_text(p).unwrap_or(p).to_string())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or_default()
    }
}

#[async_trait]
impl TextProvider for MockProvider {
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        let call = {
            let mut prompts = self
                .prompts
                .lock()
                .map_err(|_| TranslationError::Custom("模拟提供者的锁已损坏".to_string()))?;
            prompts.push(prompt.to_string());
            prompts.len()
        };

        match self.behavior {
            MockBehavior::FailOnCall(n) if n == call => Err(TranslationError::ApiError {
                code: 500,
                message: format!("模拟提供者第 {} 次调用失败", call),
            }),
            _ => {
                let source = extract_source_text(prompt).unwrap_or(prompt);
                Ok(format!("\n  {}  \n", self.expected(source)))
            }
        }
    }
}
