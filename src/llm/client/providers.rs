//! LLM Provider支持模块

use anyhow::Result;
use rig::{
    agent::Agent,
    client::CompletionClient,
    completion::Prompt,
    providers::gemini::completion::gemini_api_types::{AdditionalParameters, GenerationConfig},
};

use crate::config::{LLMConfig, LLMProvider};
use crate::llm::completion::CompletionError;

/// 对任意provider的AgentBuilder应用统一的preamble、max_tokens与temperature
macro_rules! configured {
    ($builder:expr, $system_prompt:expr, $config:expr) => {
        $builder
            .preamble($system_prompt)
            .max_tokens($config.max_tokens.into())
            .temperature($config.temperature)
    };
}

/// 统一的Provider客户端枚举
#[derive(Clone)]
pub enum ProviderClient {
    OpenAI(rig::providers::openai::Client),
    DeepSeek(rig::providers::deepseek::Client),
    Anthropic(rig::providers::anthropic::Client),
    Gemini(rig::providers::gemini::Client),
    Ollama(rig::providers::ollama::Client),
}

impl ProviderClient {
    /// 根据配置创建相应的provider客户端
    pub fn new(config: &LLMConfig) -> Result<Self> {
        let client = match config.provider {
            LLMProvider::OpenAI => ProviderClient::OpenAI(
                rig::providers::openai::Client::builder(&config.api_key)
                    .base_url(&config.api_base_url)
                    .build(),
            ),
            LLMProvider::DeepSeek => ProviderClient::DeepSeek(
                rig::providers::deepseek::Client::builder(&config.api_key)
                    .base_url(&config.api_base_url)
                    .build(),
            ),
            LLMProvider::Anthropic => ProviderClient::Anthropic(
                rig::providers::anthropic::ClientBuilder::new(&config.api_key).build()?,
            ),
            LLMProvider::Gemini => ProviderClient::Gemini(
                rig::providers::gemini::Client::builder(&config.api_key).build()?,
            ),
            LLMProvider::Ollama => {
                ProviderClient::Ollama(rig::providers::ollama::Client::builder().build())
            }
        };
        tracing::debug!("🔌 LLM provider: {}", config.provider);
        Ok(client)
    }

    /// 为指定模型创建单轮对话Agent
    pub fn create_agent(
        &self,
        model: &str,
        system_prompt: &str,
        config: &LLMConfig,
    ) -> Result<ProviderAgent> {
        let kind = match self {
            ProviderClient::OpenAI(client) => AgentKind::OpenAI(
                configured!(
                    client
                        .completion_model(model)
                        .completions_api()
                        .into_agent_builder(),
                    system_prompt,
                    config
                )
                .build(),
            ),
            ProviderClient::DeepSeek(client) => AgentKind::DeepSeek(
                configured!(client.agent(model), system_prompt, config).build(),
            ),
            ProviderClient::Anthropic(client) => AgentKind::Anthropic(
                configured!(client.agent(model), system_prompt, config).build(),
            ),
            ProviderClient::Gemini(client) => {
                let params = AdditionalParameters::default().with_config(GenerationConfig::default());
                AgentKind::Gemini(
                    configured!(client.agent(model), system_prompt, config)
                        .additional_params(serde_json::to_value(params)?)
                        .build(),
                )
            }
            ProviderClient::Ollama(client) => AgentKind::Ollama(
                configured!(client.agent(model), system_prompt, config).build(),
            ),
        };
        Ok(ProviderAgent {
            model: model.to_string(),
            kind,
        })
    }
}

enum AgentKind {
    OpenAI(Agent<rig::providers::openai::CompletionModel>),
    Anthropic(Agent<rig::providers::anthropic::completion::CompletionModel>),
    Gemini(Agent<rig::providers::gemini::completion::CompletionModel>),
    DeepSeek(Agent<rig::providers::deepseek::CompletionModel>),
    Ollama(Agent<rig::providers::ollama::CompletionModel<reqwest::Client>>),
}

/// 绑定到某个模型的Agent
pub struct ProviderAgent {
    model: String,
    kind: AgentKind,
}

impl ProviderAgent {
    pub fn model(&self) -> &str {
        &self.model
    }

    /// 执行prompt，provider错误统一为CompletionError::Provider
    pub async fn prompt(&self, prompt: &str) -> Result<String, CompletionError> {
        let result = match &self.kind {
            AgentKind::OpenAI(agent) => agent.prompt(prompt).await,
            AgentKind::DeepSeek(agent) => agent.prompt(prompt).await,
            AgentKind::Anthropic(agent) => agent.prompt(prompt).await,
            AgentKind::Gemini(agent) => agent.prompt(prompt).await,
            AgentKind::Ollama(agent) => agent.prompt(prompt).await,
        };
        result.map_err(|e| CompletionError::Provider(format!("{}: {}", self.model, e)))
    }
}
