use std::sync::Arc;
use std::time::Instant;

use super::embedding::Embedder;
use super::error::{BuildError, EmbeddingError, LoadError};
use super::key::{DocumentSource, EntityKey, IndexHandle};
use super::vector_index::VectorIndex;
use crate::cache::{IndexCache, IndexedDocument, PersistedIndex};
use crate::store::{Document, DocumentStore};

/// ensure_index的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStatus {
    pub already_existed: bool,
    pub built: bool,
    pub document_count: usize,
}

/// 向量索引构建器
///
/// 负责判断索引是否需要构建、拉取源文档、嵌入并持久化。
/// 同一索引的构建与失效在per-key锁下串行执行。
#[derive(Clone)]
pub struct VectorIndexBuilder {
    cache: Arc<IndexCache>,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn DocumentStore>,
    min_score: f32,
}

impl VectorIndexBuilder {
    pub fn new(
        cache: Arc<IndexCache>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn DocumentStore>,
        min_score: f32,
    ) -> Self {
        Self {
            cache,
            embedder,
            store,
            min_score,
        }
    }

    pub fn cache(&self) -> &IndexCache {
        &self.cache
    }

    /// 确保索引存在且可加载，否则从文档来源重新构建
    pub async fn ensure_index(&self, handle: &IndexHandle) -> Result<IndexStatus, BuildError> {
        let key = &handle.key;
        let _guard = self.cache.lock(key).await.map_err(|source| BuildError::Io {
            key: key.clone(),
            source,
        })?;

        match self
            .cache
            .read_artifact(key, &self.embedder.model_id(), self.embedder.dimension())
            .await
        {
            Ok(existing) => {
                self.cache
                    .monitor()
                    .record_cache_hit(key.as_str(), existing.entries.len());
                return Ok(IndexStatus {
                    already_existed: true,
                    built: false,
                    document_count: existing.entries.len(),
                });
            }
            Err(e) => {
                tracing::debug!("索引 [{}] 需要构建: {}", key, e);
                self.cache.monitor().record_cache_miss(key.as_str());
            }
        }

        let documents = self.fetch_documents(&handle.source).await;
        if documents.is_empty() {
            return Err(BuildError::NoDocuments { key: key.clone() });
        }

        let start = Instant::now();
        let entries = self.embed_documents(key, documents).await?;
        let document_count = entries.len();

        let persisted = PersistedIndex::new(
            key,
            self.embedder.model_id(),
            self.embedder.dimension(),
            entries,
        );
        self.cache.write_artifact(&persisted).await?;
        self.cache
            .monitor()
            .record_build(key.as_str(), document_count, start.elapsed());

        Ok(IndexStatus {
            already_existed: false,
            built: true,
            document_count,
        })
    }

    /// 无条件删除持久化索引
    pub async fn invalidate(&self, key: &EntityKey) -> std::io::Result<()> {
        let _guard = self.cache.lock(key).await?;
        let existed = self.cache.remove(key).await?;
        if existed {
            self.cache.monitor().record_invalidation(key.as_str());
        }
        Ok(())
    }

    /// 加载索引用于检索
    pub async fn open(&self, key: &EntityKey) -> Result<VectorIndex, LoadError> {
        VectorIndex::load(&self.cache, self.embedder.clone(), key, self.min_score).await
    }

    async fn fetch_documents(&self, source: &DocumentSource) -> Vec<Document> {
        match source {
            DocumentSource::Subject { subject_id } => {
                self.store.fetch_subject_documents(subject_id).await
            }
            DocumentSource::Related {
                keyword,
                excluding_subject_id,
            } => self
                .store
                .fetch_related_documents(keyword, excluding_subject_id)
                .await
                .into_values()
                .flatten()
                .collect(),
        }
    }

    async fn embed_documents(
        &self,
        key: &EntityKey,
        documents: Vec<Document>,
    ) -> Result<Vec<IndexedDocument>, BuildError> {
        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let embedding_error = |source| BuildError::Embedding {
            key: key.clone(),
            source,
        };

        let vectors = self
            .embedder
            .embed_batch(&texts)
            .await
            .map_err(embedding_error)?;
        if vectors.len() != documents.len() {
            return Err(embedding_error(EmbeddingError::CountMismatch {
                expected: documents.len(),
                actual: vectors.len(),
            }));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.embedder.dimension()) {
            return Err(embedding_error(EmbeddingError::InvalidDimension {
                expected: self.embedder.dimension(),
                actual: bad.len(),
            }));
        }

        Ok(documents
            .into_iter()
            .zip(vectors)
            .map(|(document, vector)| IndexedDocument { document, vector })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::embedding::HashingEmbedder;
    use crate::index::error::LoadFailureReason;
    use crate::store::{DocumentKind, MemoryDocumentStore, RelatedDocuments};
    use tempfile::TempDir;

    fn builder_with(temp_dir: &TempDir, store: Arc<MemoryDocumentStore>) -> VectorIndexBuilder {
        VectorIndexBuilder::new(
            Arc::new(IndexCache::new(temp_dir.path())),
            Arc::new(HashingEmbedder::new(64)),
            store,
            0.0,
        )
    }

    fn subject_store() -> Arc<MemoryDocumentStore> {
        let store = MemoryDocumentStore::default();
        store.insert_subject(
            "X1",
            vec![
                Document::description("X1", "Ergonomic wireless mouse", false),
                Document::review("X1", DocumentKind::PositiveReview, 0, "Battery lasts", false),
            ],
        );
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_second_ensure_is_cache_hit() {
        let temp_dir = TempDir::new().unwrap();
        let store = subject_store();
        let builder = builder_with(&temp_dir, store.clone());
        let handle = IndexHandle::subject("X1");

        let first = builder.ensure_index(&handle).await.unwrap();
        assert_eq!(
            first,
            IndexStatus {
                already_existed: false,
                built: true,
                document_count: 2
            }
        );

        let second = builder.ensure_index(&handle).await.unwrap();
        assert!(second.already_existed);
        assert!(!second.built);
        assert_eq!(second.document_count, 2);
        // 命中时不再拉取文档
        assert_eq!(store.subject_fetches(), 1);
    }

    #[tokio::test]
    async fn test_no_documents_is_build_error() {
        let temp_dir = TempDir::new().unwrap();
        let builder = builder_with(&temp_dir, Arc::new(MemoryDocumentStore::default()));

        let err = builder
            .ensure_index(&IndexHandle::subject("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::NoDocuments { .. }));
        assert_eq!(err.key().as_str(), "ghost");
        assert!(!builder.cache().artifact_path(err.key()).exists());
    }

    #[tokio::test]
    async fn test_related_index_flattens_competitors() {
        let temp_dir = TempDir::new().unwrap();
        let store = MemoryDocumentStore::default();
        let mut related = RelatedDocuments::new();
        related.insert(
            "C1".to_string(),
            vec![Document::description("C1", "Budget mouse", true)],
        );
        related.insert(
            "C2".to_string(),
            vec![
                Document::description("C2", "Gaming mouse", true),
                Document::review("C2", DocumentKind::CriticalReview, 0, "Too heavy", true),
            ],
        );
        store.insert_related("wireless mouse", "X1", related);
        let builder = builder_with(&temp_dir, Arc::new(store));

        let handle = IndexHandle::related("wireless mouse", "X1");
        let status = builder.ensure_index(&handle).await.unwrap();
        assert_eq!(status.document_count, 3);
        assert!(
            builder
                .cache()
                .artifact_path(&handle.key)
                .ends_with("wireless_mouse.index.json")
        );
    }

    #[tokio::test]
    async fn test_corrupt_artifact_is_rebuilt() {
        let temp_dir = TempDir::new().unwrap();
        let builder = builder_with(&temp_dir, subject_store());
        let handle = IndexHandle::subject("X1");
        std::fs::write(builder.cache().artifact_path(&handle.key), "garbage").unwrap();

        let status = builder.ensure_index(&handle).await.unwrap();
        assert!(status.built);
        assert!(builder.open(&handle.key).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalidate_then_open_is_missing() {
        let temp_dir = TempDir::new().unwrap();
        let builder = builder_with(&temp_dir, subject_store());
        let handle = IndexHandle::subject("X1");
        builder.ensure_index(&handle).await.unwrap();

        builder.invalidate(&handle.key).await.unwrap();
        let err = builder.open(&handle.key).await.err().unwrap();
        assert_eq!(err.reason, LoadFailureReason::Missing);

        // 对不存在的索引失效也不报错
        builder.invalidate(&handle.key).await.unwrap();
        assert_eq!(builder.cache().monitor().generate_report().invalidations, 1);
    }

    #[tokio::test]
    async fn test_concurrent_ensure_builds_once() {
        let temp_dir = TempDir::new().unwrap();
        let store = subject_store();
        let builder = builder_with(&temp_dir, store.clone());
        let handle = IndexHandle::subject("X1");

        let (a, b) = tokio::join!(builder.ensure_index(&handle), builder.ensure_index(&handle));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(a.built ^ b.built);
        assert_eq!(store.subject_fetches(), 1);
    }
}
