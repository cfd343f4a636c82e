use std::sync::Arc;

use anyhow::Result;

use crate::cache::IndexCache;
use crate::config::Config;
use crate::index::{Embedder, VectorIndexBuilder, build_embedder};
use crate::llm::{CompletionService, LLMClient};
use crate::store::{CatalogDocumentStore, DocumentStore};

/// 单次运行共享的组件
#[derive(Clone)]
pub struct GeneratorContext {
    /// 配置
    pub config: Config,
    /// 模型调用
    pub completion: Arc<dyn CompletionService>,
    /// 索引构建与加载
    pub indices: VectorIndexBuilder,
}

impl GeneratorContext {
    /// 按配置创建真实的LLM客户端、文档来源与嵌入模型
    pub fn new(config: Config) -> Result<Self> {
        let completion = Arc::new(LLMClient::new(config.clone())?);
        let documents = Arc::new(CatalogDocumentStore::new(&config.store));
        let embedder = build_embedder(&config.embedding)?;
        Ok(Self::with_services(config, completion, documents, embedder))
    }

    pub fn with_services(
        config: Config,
        completion: Arc<dyn CompletionService>,
        documents: Arc<dyn DocumentStore>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        let cache = Arc::new(IndexCache::new(config.index.data_dir.clone()));
        let indices = VectorIndexBuilder::new(cache, embedder, documents, config.index.min_score);
        Self {
            config,
            completion,
            indices,
        }
    }
}
