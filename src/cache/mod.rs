//! 持久化向量索引的磁盘存储

use chrono::{DateTime, Utc};
use fs2::FileExt;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tokio::fs;

use crate::index::error::{BuildError, LoadError, LoadFailureReason};
use crate::index::key::EntityKey;
use crate::store::Document;

pub mod performance_monitor;
pub use performance_monitor::{IndexCachePerformanceMonitor, IndexCacheReport};

/// 索引文件格式版本，格式变化时递增
pub const INDEX_SCHEMA_VERSION: u32 = 1;

const ARTIFACT_SUFFIX: &str = ".index.json";

const LOCK_SUFFIX: &str = ".index.lock";

/// 已嵌入的文档
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub document: Document,
    pub vector: Vec<f32>,
}

/// 索引文件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedIndex {
    pub schema_version: u32,
    pub embedding_model: String,
    pub dimension: usize,
    pub entity_key: EntityKey,
    /// 源文档文本的MD5，用于排查数据漂移
    pub source_fingerprint: String,
    pub created_at: DateTime<Utc>,
    pub entries: Vec<IndexedDocument>,
}

impl PersistedIndex {
    pub fn new(
        key: &EntityKey,
        embedding_model: String,
        dimension: usize,
        entries: Vec<IndexedDocument>,
    ) -> Self {
        let source_fingerprint =
            IndexCache::fingerprint(entries.iter().map(|e| &e.document));
        Self {
            schema_version: INDEX_SCHEMA_VERSION,
            embedding_model,
            dimension,
            entity_key: key.clone(),
            source_fingerprint,
            created_at: Utc::now(),
            entries,
        }
    }
}

/// 只解析头部字段，用于区分版本不一致与文件损坏
#[derive(Deserialize)]
struct ArtifactHeader {
    schema_version: u32,
    embedding_model: String,
    dimension: usize,
}

/// 索引锁文件上的独占锁，drop时释放
pub struct IndexLockGuard {
    file: std::fs::File,
}

impl Drop for IndexLockGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// 索引缓存管理器
pub struct IndexCache {
    data_dir: PathBuf,
    performance_monitor: IndexCachePerformanceMonitor,
}

impl IndexCache {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            performance_monitor: IndexCachePerformanceMonitor::new(),
        }
    }

    pub fn monitor(&self) -> &IndexCachePerformanceMonitor {
        &self.performance_monitor
    }

    /// 获取索引文件路径
    pub fn artifact_path(&self, key: &EntityKey) -> PathBuf {
        self.data_dir
            .join(format!("{}{}", key.as_str(), ARTIFACT_SUFFIX))
    }

    /// 获取锁文件路径
    pub fn lock_path(&self, key: &EntityKey) -> PathBuf {
        self.data_dir.join(format!("{}{}", key.as_str(), LOCK_SUFFIX))
    }

    /// 获取某个索引的独占锁
    ///
    /// 构建、失效与"检查存在后创建"都必须持有该锁。锁落在
    /// `<data_dir>/<key>.index.lock` 上，对同一数据目录的其他进程同样生效。
    pub async fn lock(&self, key: &EntityKey) -> std::io::Result<IndexLockGuard> {
        fs::create_dir_all(&self.data_dir).await?;
        let path = self.lock_path(key);
        let label = key.to_string();

        tokio::task::spawn_blocking(move || -> std::io::Result<IndexLockGuard> {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(&path)?;

            let start = Instant::now();
            FileExt::lock_exclusive(&file)?;
            let waited = start.elapsed();
            if waited.as_millis() > 0 {
                tracing::debug!("🔒 等待索引锁 [{}] {}ms", label, waited.as_millis());
            }
            Ok(IndexLockGuard { file })
        })
        .await
        .map_err(std::io::Error::other)?
    }

    /// 生成文档集合的MD5指纹
    pub fn fingerprint<'a>(documents: impl IntoIterator<Item = &'a Document>) -> String {
        let mut hasher = Md5::new();
        for document in documents {
            hasher.update(document.id.as_bytes());
            hasher.update([0u8]);
            hasher.update(document.text.as_bytes());
            hasher.update([0u8]);
        }
        format!("{:x}", hasher.finalize())
    }

    /// 读取并校验索引文件
    pub async fn read_artifact(
        &self,
        key: &EntityKey,
        embedding_model: &str,
        dimension: usize,
    ) -> Result<PersistedIndex, LoadError> {
        let path = self.artifact_path(key);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoadError::new(
                    key,
                    LoadFailureReason::Missing,
                    format!("{} does not exist", path.display()),
                ));
            }
            Err(e) => {
                return Err(LoadError::new(
                    key,
                    LoadFailureReason::Corrupt,
                    format!("读取文件失败: {}", e),
                ));
            }
        };

        let header: ArtifactHeader = serde_json::from_str(&content).map_err(|e| {
            LoadError::new(key, LoadFailureReason::Corrupt, format!("头部解析失败: {}", e))
        })?;

        if header.schema_version != INDEX_SCHEMA_VERSION
            || header.embedding_model != embedding_model
            || header.dimension != dimension
        {
            return Err(LoadError::new(
                key,
                LoadFailureReason::VersionMismatch,
                format!(
                    "built with schema v{} / {} ({}d), expected schema v{} / {} ({}d)",
                    header.schema_version,
                    header.embedding_model,
                    header.dimension,
                    INDEX_SCHEMA_VERSION,
                    embedding_model,
                    dimension
                ),
            ));
        }

        let persisted: PersistedIndex = serde_json::from_str(&content).map_err(|e| {
            LoadError::new(key, LoadFailureReason::Corrupt, format!("反序列化失败: {}", e))
        })?;

        if persisted.entity_key != *key {
            return Err(LoadError::new(
                key,
                LoadFailureReason::Corrupt,
                format!("artifact belongs to {}", persisted.entity_key),
            ));
        }
        if let Some(entry) = persisted
            .entries
            .iter()
            .find(|e| e.vector.len() != dimension)
        {
            return Err(LoadError::new(
                key,
                LoadFailureReason::Corrupt,
                format!(
                    "document {} has a {}d vector",
                    entry.document.id,
                    entry.vector.len()
                ),
            ));
        }

        Ok(persisted)
    }

    /// 写入索引文件：先写临时文件再原子重命名
    pub async fn write_artifact(&self, index: &PersistedIndex) -> Result<(), BuildError> {
        let key = &index.entity_key;
        let io_error = |source| BuildError::Io {
            key: key.clone(),
            source,
        };

        fs::create_dir_all(&self.data_dir).await.map_err(io_error)?;

        let content = serde_json::to_vec(index).map_err(|source| BuildError::Serialization {
            key: key.clone(),
            source,
        })?;

        let path = self.artifact_path(key);
        let tmp_path = self.data_dir.join(format!(
            "{}{}.tmp-{}",
            key.as_str(),
            ARTIFACT_SUFFIX,
            uuid::Uuid::new_v4()
        ));
        fs::write(&tmp_path, content).await.map_err(io_error)?;
        if let Err(e) = fs::rename(&tmp_path, &path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(io_error(e));
        }
        Ok(())
    }

    /// 删除索引文件，返回文件是否存在过
    pub async fn remove(&self, key: &EntityKey) -> std::io::Result<bool> {
        match fs::remove_file(self.artifact_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}
