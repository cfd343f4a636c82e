//! LLM客户端 - 提供统一的LLM服务接口

use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use crate::config::Config;
use crate::llm::completion::{CompletionError, CompletionService};

mod providers;
pub mod utils;

use providers::{ProviderAgent, ProviderClient};
use utils::evaluate_befitting_model;

/// LLM客户端 - 提供统一的LLM服务接口
#[derive(Clone)]
pub struct LLMClient {
    config: Config,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: Config) -> Result<Self> {
        let client = ProviderClient::new(&config.llm)?;
        Ok(Self { client, config })
    }

    /// 通用重试逻辑，用于处理异步操作的重试机制
    async fn retry_with_backoff<T, F, Fut>(&self, operation: F) -> Result<T, CompletionError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, CompletionError>>,
    {
        let llm_config = &self.config.llm;
        let max_retries = llm_config.retry_attempts.max(1);
        let retry_delay_ms = llm_config.retry_delay_ms;
        let mut retries = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    retries += 1;
                    tracing::warn!(
                        "❌ 调用模型服务出错，重试中 (第 {} / {}次尝试): {}",
                        retries,
                        max_retries,
                        err
                    );
                    if retries >= max_retries {
                        return Err(err);
                    }
                    tokio::time::sleep(Duration::from_millis(retry_delay_ms)).await;
                }
            }
        }
    }

    /// 单轮对话，efficient模型失败后切换到powerful模型
    pub async fn prompt(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, CompletionError> {
        let (befitting_model, fallover_model) =
            evaluate_befitting_model(&self.config.llm, system_prompt, user_prompt);

        self.prompt_inner(system_prompt, user_prompt, befitting_model, fallover_model)
            .await
    }

    async fn prompt_inner(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        befitting_model: String,
        fallover_model: Option<String>,
    ) -> Result<String, CompletionError> {
        let agent = self
            .client
            .create_agent(&befitting_model, system_prompt, &self.config.llm)?;

        match self
            .retry_with_backoff(|| self.prompt_once(&agent, user_prompt))
            .await
        {
            Ok(text) => Ok(text),
            Err(e) => match fallover_model {
                Some(model) => {
                    tracing::warn!(
                        "❌ 调用模型服务出错，尝试 {} 次均失败，尝试使用备选模型{}...{}",
                        self.config.llm.retry_attempts,
                        model,
                        e
                    );
                    Box::pin(self.prompt_inner(system_prompt, user_prompt, model, None)).await
                }
                None => {
                    tracing::error!(
                        "❌ 调用模型服务出错，尝试 {} 次均失败...{}",
                        self.config.llm.retry_attempts,
                        e
                    );
                    Err(e)
                }
            },
        }
    }

    /// 单次调用，受timeout_seconds约束
    async fn prompt_once(
        &self,
        agent: &ProviderAgent,
        user_prompt: &str,
    ) -> Result<String, CompletionError> {
        let seconds = self.config.llm.timeout_seconds;
        tracing::debug!("🤖 调用模型 {} ({}字节)", agent.model(), user_prompt.len());
        tokio::time::timeout(Duration::from_secs(seconds), agent.prompt(user_prompt))
            .await
            .unwrap_or(Err(CompletionError::Timeout { seconds }))
    }
}

#[async_trait]
impl CompletionService for LLMClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        self.prompt(&self.config.llm.system_prompt, prompt).await
    }
}
