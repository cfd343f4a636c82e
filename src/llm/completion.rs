use async_trait::async_trait;
use thiserror::Error;

/// 模型调用失败
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("completion timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("completion provider error: {0}")]
    Provider(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// 文本补全能力：prompt进，文本出
///
/// 不保证输出结构，所有结构化约束由调用方负责。
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}
