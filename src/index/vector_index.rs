use std::cmp::Ordering;
use std::sync::Arc;

use super::embedding::{Embedder, cosine_similarity};
use super::error::{EmbeddingError, LoadError};
use super::key::EntityKey;
use crate::cache::{IndexCache, IndexedDocument};
use crate::store::Document;

/// 一条检索结果
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedDocument {
    pub document: Document,
    pub score: f32,
}

/// 一次检索的结果，按相关度降序排列
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievedContext {
    pub documents: Vec<RetrievedDocument>,
}

impl RetrievedContext {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RetrievedDocument> {
        self.documents.iter()
    }
}

/// 已加载、可查询的向量索引
pub struct VectorIndex {
    key: EntityKey,
    entries: Vec<IndexedDocument>,
    embedder: Arc<dyn Embedder>,
    min_score: f32,
}

impl VectorIndex {
    /// 从磁盘加载索引
    pub async fn load(
        cache: &IndexCache,
        embedder: Arc<dyn Embedder>,
        key: &EntityKey,
        min_score: f32,
    ) -> Result<Self, LoadError> {
        let persisted = match cache
            .read_artifact(key, &embedder.model_id(), embedder.dimension())
            .await
        {
            Ok(persisted) => persisted,
            Err(e) => {
                cache.monitor().record_load_failure(key.as_str(), &e.to_string());
                return Err(e);
            }
        };

        tracing::debug!(
            "📂 加载索引 [{}]: {}条文档 (创建于 {})",
            key,
            persisted.entries.len(),
            persisted.created_at
        );

        Ok(Self {
            key: key.clone(),
            entries: persisted.entries,
            embedder,
            min_score,
        })
    }

    /// 检索与query最相关的至多k条文档
    ///
    /// 只返回得分严格高于相关度下限的文档；同分时先入索引者在前。
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievedContext, EmbeddingError> {
        if k == 0 || self.entries.is_empty() {
            return Ok(RetrievedContext::default());
        }

        let query_vector = self.embedder.embed(query).await?;
        if query_vector.len() != self.embedder.dimension() {
            return Err(EmbeddingError::InvalidDimension {
                expected: self.embedder.dimension(),
                actual: query_vector.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(&query_vector, &entry.vector)))
            .filter(|(_, score)| !score.is_nan() && *score > self.min_score)
            .collect();

        // sort_by是稳定排序
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        tracing::debug!("🔎 索引 [{}] 命中 {} / {} 条", self.key, scored.len(), self.entries.len());

        Ok(RetrievedContext {
            documents: scored
                .into_iter()
                .map(|(i, score)| RetrievedDocument {
                    document: self.entries[i].document.clone(),
                    score,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::PersistedIndex;
    use crate::index::error::LoadFailureReason;
    use crate::store::DocumentKind;
    use async_trait::async_trait;
    use tempfile::TempDir;

    /// 把文本中的 a/b/c 计数映射为三维向量
    struct AxisEmbedder;

    #[async_trait]
    impl Embedder for AxisEmbedder {
        fn model_id(&self) -> String {
            "axis".to_string()
        }

        fn dimension(&self) -> usize {
            3
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts
                .iter()
                .map(|t| {
                    ['a', 'b', 'c']
                        .iter()
                        .map(|axis| t.chars().filter(|c| c == axis).count() as f32)
                        .collect()
                })
                .collect())
        }
    }

    fn entry(ordinal: usize, vector: Vec<f32>) -> IndexedDocument {
        IndexedDocument {
            document: Document::new(
                "X1",
                DocumentKind::PositiveReview,
                ordinal,
                format!("review {}", ordinal),
            ),
            vector,
        }
    }

    async fn index_with(entries: Vec<IndexedDocument>, min_score: f32) -> (TempDir, VectorIndex) {
        let temp_dir = TempDir::new().unwrap();
        let cache = IndexCache::new(temp_dir.path());
        let key = EntityKey::for_subject("X1");
        cache
            .write_artifact(&PersistedIndex::new(&key, "axis".to_string(), 3, entries))
            .await
            .unwrap();
        let index = VectorIndex::load(&cache, Arc::new(AxisEmbedder), &key, min_score)
            .await
            .unwrap();
        (temp_dir, index)
    }

    #[tokio::test]
    async fn test_retrieve_orders_by_score_and_limits_k() {
        let (_dir, index) = index_with(
            vec![
                entry(0, vec![0.0, 1.0, 0.0]),
                entry(1, vec![1.0, 0.0, 0.0]),
                entry(2, vec![1.0, 1.0, 0.0]),
                entry(3, vec![1.0, 0.1, 0.0]),
            ],
            0.0,
        )
        .await;

        let context = index.retrieve("a", 2).await.unwrap();
        let ids: Vec<_> = context.iter().map(|d| d.document.id.as_str()).collect();
        assert_eq!(ids, vec!["X1:positive_review:1", "X1:positive_review:3"]);
        assert!(context.documents[0].score >= context.documents[1].score);
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let (_dir, index) = index_with(
            vec![
                entry(0, vec![1.0, 0.0, 0.0]),
                entry(1, vec![2.0, 0.0, 0.0]),
                entry(2, vec![3.0, 0.0, 0.0]),
            ],
            0.0,
        )
        .await;

        let context = index.retrieve("a", 5).await.unwrap();
        let ids: Vec<_> = context.iter().map(|d| d.document.id.clone()).collect();
        assert_eq!(
            ids,
            vec![
                "X1:positive_review:0",
                "X1:positive_review:1",
                "X1:positive_review:2"
            ]
        );
    }

    #[tokio::test]
    async fn test_nothing_above_floor_is_empty_not_error() {
        let (_dir, index) = index_with(vec![entry(0, vec![0.0, 1.0, 0.0])], 0.0).await;
        let context = index.retrieve("a", 5).await.unwrap();
        assert!(context.is_empty());
    }

    #[tokio::test]
    async fn test_retrieve_is_deterministic() {
        let (_dir, index) = index_with(
            vec![entry(0, vec![1.0, 1.0, 0.0]), entry(1, vec![0.0, 1.0, 1.0])],
            0.0,
        )
        .await;
        let first = index.retrieve("ab", 5).await.unwrap();
        let second = index.retrieve("ab", 5).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_empty_index_returns_empty_context() {
        let (_dir, index) = index_with(Vec::new(), 0.0).await;
        assert!(index.entries.is_empty());
        assert!(index.retrieve("a", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_records_failure() {
        let temp_dir = TempDir::new().unwrap();
        let cache = IndexCache::new(temp_dir.path());
        let result = VectorIndex::load(
            &cache,
            Arc::new(AxisEmbedder),
            &EntityKey::for_subject("X1"),
            0.0,
        )
        .await;

        assert_eq!(result.err().unwrap().reason, LoadFailureReason::Missing);
        assert_eq!(cache.monitor().generate_report().load_failures, 1);
    }
}
