use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// 默认配置文件名，位于当前工作目录
pub const DEFAULT_CONFIG_FILE: &str = "rivalscope.toml";

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "gemini")]
    #[default]
    Gemini,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "ollama")]
    Ollama,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::Gemini => write!(f, "gemini"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "gemini" => Ok(LLMProvider::Gemini),
            "anthropic" => Ok(LLMProvider::Anthropic),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// 嵌入模型类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum EmbeddingProvider {
    /// 本地确定性特征哈希，无需网络
    #[serde(rename = "hashing")]
    #[default]
    Hashing,
    /// OpenAI兼容的 /embeddings 接口
    #[serde(rename = "openai")]
    OpenAI,
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hashing" => Ok(EmbeddingProvider::Hashing),
            "openai" => Ok(EmbeddingProvider::OpenAI),
            _ => Err(format!("Unknown embedding provider: {}", s)),
        }
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    /// 报告输出目录
    pub output_path: PathBuf,

    /// 只向标准输出打印JSON报告
    pub json_output: bool,

    /// 强制删除并重建向量索引，同时为本次运行开启加载恢复
    pub force_rebuild: bool,

    /// 是否额外输出Markdown报告
    pub write_markdown: bool,

    /// 是否启用详细日志
    pub verbose: bool,

    /// LLM模型配置
    pub llm: LLMConfig,

    /// 嵌入模型配置
    pub embedding: EmbeddingConfig,

    /// 向量索引配置
    pub index: IndexConfig,

    /// 文档来源配置
    pub store: StoreConfig,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址
    pub api_base_url: String,

    /// 高能效模型，优先使用
    pub model_efficient: String,

    /// 高质量模型，用于超长prompt以及efficient失效时的兜底
    pub model_powerful: String,

    /// 最大tokens
    pub max_tokens: u32,

    /// 温度
    pub temperature: f64,

    /// 重试次数
    pub retry_attempts: u32,

    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,

    /// 单次调用超时时间（秒）
    pub timeout_seconds: u64,

    /// 系统提示词
    pub system_prompt: String,
}

/// 嵌入模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,

    /// 模型名称，写入索引文件用于版本校验
    pub model: String,

    /// 向量维度
    pub dimension: usize,

    pub api_base_url: String,

    pub api_key: String,

    /// 单次请求的最大文本数
    pub batch_size: usize,
}

/// 向量索引配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct IndexConfig {
    /// 索引文件目录
    pub data_dir: PathBuf,

    /// 每次检索返回的最大条数
    pub top_k: usize,

    /// 相关度下限，得分必须严格大于该值
    pub min_score: f32,

    /// 单条检索结果写入prompt时的最大字符数
    pub max_chars_per_document: usize,

    /// 索引加载失败时是否删除并重建
    pub recover_on_load_failure: bool,
}

/// 文档来源配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    /// 商品数据目录
    pub catalog_dir: PathBuf,

    /// 每个关键词最多关联的竞品数
    pub max_related_entities: usize,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// 本次运行是否允许加载失败后的重建恢复
    pub fn recovery_enabled(&self) -> bool {
        self.force_rebuild || self.index.recover_on_load_failure
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("."),
            json_output: false,
            force_rebuild: false,
            write_markdown: true,
            verbose: false,
            llm: LLMConfig::default(),
            embedding: EmbeddingConfig::default(),
            index: IndexConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: std::env::var("RIVALSCOPE_LLM_API_KEY").unwrap_or_default(),
            api_base_url: String::from("https://generativelanguage.googleapis.com"),
            model_efficient: String::from("gemini-1.5-flash"),
            model_powerful: String::from("gemini-1.5-pro"),
            max_tokens: 8192,
            temperature: 0.0,
            retry_attempts: 3,
            retry_delay_ms: 2000,
            timeout_seconds: 120,
            system_prompt: String::from(
                "You are a senior e-commerce analyst. Ground every statement in the material you are given.",
            ),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            model: String::from("BAAI/bge-small-en-v1.5"),
            dimension: 384,
            api_base_url: String::from("http://localhost:8080/v1"),
            api_key: std::env::var("RIVALSCOPE_EMBEDDING_API_KEY").unwrap_or_default(),
            batch_size: 32,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            top_k: 5,
            min_score: 0.0,
            max_chars_per_document: 2000,
            recover_on_load_failure: false,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            catalog_dir: PathBuf::from("./data/catalog"),
            max_related_entities: 5,
        }
    }
}

// Include tests
#[cfg(test)]
mod tests;
