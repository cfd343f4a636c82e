use crate::config::{Config, DEFAULT_CONFIG_FILE, EmbeddingProvider, LLMProvider};
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;

/// RivalScope-RS - 由Rust与AI驱动的商品竞品分析引擎
#[derive(Parser, Debug)]
#[command(name = "RivalScope (rivalscope-rs)")]
#[command(
    about = "AI-based product analysis engine. It indexes a product and the competitors found for a search keyword, then produces a structured pros/cons and sales-improvement report."
)]
#[command(version)]
pub struct Args {
    /// 主体商品id（ASIN）
    #[arg(long, visible_alias = "subject-id")]
    pub asin: String,

    /// 用于查找竞品的搜索关键词
    #[arg(short, long)]
    pub keyword: String,

    /// 只向标准输出打印JSON报告
    #[arg(long)]
    pub json: bool,

    /// 删除并重建两个向量索引
    #[arg(long)]
    pub force_rebuild: bool,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 报告输出目录
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// 向量索引目录
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// 商品数据目录
    #[arg(long)]
    pub catalog_dir: Option<PathBuf>,

    /// 不输出Markdown报告
    #[arg(long)]
    pub no_markdown: bool,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,

    /// 索引加载失败时删除并重建
    #[arg(long)]
    pub recover_on_load_failure: bool,

    /// LLM Provider (openai, gemini, anthropic, deepseek, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// 高能效模型，优先用于常规推理
    #[arg(long)]
    pub model_efficient: Option<String>,

    /// 高质量模型，用于超长prompt以及efficient失效时的兜底
    #[arg(long)]
    pub model_powerful: Option<String>,

    /// 最大tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// 单次模型调用超时（秒）
    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// 每次检索返回的最大条数
    #[arg(long)]
    pub top_k: Option<usize>,

    /// 嵌入模型 (hashing, openai)
    #[arg(long)]
    pub embedding_provider: Option<String>,
}

/// 一次运行所需的全部输入
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub config: Config,
    pub subject_id: String,
    pub keyword: String,
}

impl Args {
    /// 将CLI参数转换为运行请求，CLI参数覆盖配置文件
    pub fn into_request(self) -> Result<RunRequest> {
        let subject_id = self.asin.trim().to_string();
        let keyword = self.keyword.trim().to_string();
        if subject_id.is_empty() {
            bail!("ASIN is required.");
        }
        if keyword.is_empty() {
            bail!("Search keyword is required.");
        }

        let mut config = if let Some(config_path) = &self.config {
            Config::from_file(config_path)
                .with_context(|| format!("无法读取配置文件 {:?}", config_path))?
        } else {
            let default_config_path = std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(DEFAULT_CONFIG_FILE);

            if default_config_path.exists() {
                Config::from_file(&default_config_path).with_context(|| {
                    format!("无法读取默认配置文件 {:?}", default_config_path)
                })?
            } else {
                Config::default()
            }
        };

        if let Some(output_path) = self.output_path {
            config.output_path = output_path;
        }
        if let Some(data_dir) = self.data_dir {
            config.index.data_dir = data_dir;
        }
        if let Some(catalog_dir) = self.catalog_dir {
            config.store.catalog_dir = catalog_dir;
        }

        // 覆盖LLM配置
        if let Some(provider_str) = self.llm_provider {
            config.llm.provider = provider_str
                .parse::<LLMProvider>()
                .map_err(anyhow::Error::msg)?;
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url;
        }
        if let Some(llm_api_key) = self.llm_api_key {
            config.llm.api_key = llm_api_key;
        }
        if let Some(model_efficient) = self.model_efficient {
            config.llm.model_efficient = model_efficient;
        }
        if let Some(model_powerful) = self.model_powerful {
            config.llm.model_powerful = model_powerful;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }
        if let Some(timeout_seconds) = self.timeout_seconds {
            config.llm.timeout_seconds = timeout_seconds;
        }

        // 检索与嵌入
        if let Some(top_k) = self.top_k {
            config.index.top_k = top_k;
        }
        if let Some(embedding_provider) = self.embedding_provider {
            config.embedding.provider = embedding_provider
                .parse::<EmbeddingProvider>()
                .map_err(anyhow::Error::msg)?;
        }
        if self.recover_on_load_failure {
            config.index.recover_on_load_failure = true;
        }

        // 其他配置
        config.json_output = config.json_output || self.json;
        config.force_rebuild = config.force_rebuild || self.force_rebuild;
        if self.no_markdown {
            config.write_markdown = false;
        }
        config.verbose = config.verbose || self.verbose;

        Ok(RunRequest {
            config,
            subject_id,
            keyword,
        })
    }
}

// Include tests
#[cfg(test)]
mod tests;
