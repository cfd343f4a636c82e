//! 基于本地目录的商品数据目录（采集数据库的导出）
//!
//! 目录结构：
//! - `products/<id>.json`：`{"description": ..., "reviews": {"positive": [...], "critical": [...]}}`
//! - `search_results.json`：`[{"keyword": ..., "excluded_id": ..., "related_ids": [...]}]`

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use super::{Document, DocumentKind, DocumentStore, RelatedDocuments, render_record};
use crate::config::StoreConfig;
use crate::index::key::sanitize;

#[derive(Debug, Default, Deserialize)]
struct ProductRecord {
    #[serde(default)]
    description: Value,
    #[serde(default)]
    reviews: ReviewBuckets,
}

#[derive(Debug, Default, Deserialize)]
struct ReviewBuckets {
    #[serde(default)]
    positive: Vec<Value>,
    #[serde(default)]
    critical: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    keyword: String,
    #[serde(default)]
    excluded_id: String,
    #[serde(default)]
    related_ids: Vec<String>,
}

pub struct CatalogDocumentStore {
    catalog_dir: PathBuf,
    max_related_entities: usize,
}

impl CatalogDocumentStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            catalog_dir: config.catalog_dir.clone(),
            max_related_entities: config.max_related_entities,
        }
    }

    fn product_path(&self, entity_id: &str) -> PathBuf {
        self.catalog_dir
            .join("products")
            .join(format!("{}.json", sanitize(entity_id)))
    }

    async fn read_json<T>(path: &Path) -> Option<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => {
                debug!("📭 无法读取 {}: {}", path.display(), e);
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("⚠️ 数据文件格式错误 {}: {}", path.display(), e);
                None
            }
        }
    }

    async fn load_entity(&self, entity_id: &str, competitor: bool) -> Vec<Document> {
        let Some(record) = Self::read_json::<ProductRecord>(&self.product_path(entity_id)).await
        else {
            return Vec::new();
        };
        documents_from_record(entity_id, record, competitor)
    }
}

fn documents_from_record(entity_id: &str, record: ProductRecord, competitor: bool) -> Vec<Document> {
    let mut documents = Vec::new();

    let description = render_record(&record.description);
    if !description.is_empty() {
        documents.push(
            Document::description(entity_id, &description, competitor)
                .with_metadata(record.description),
        );
    }

    let buckets = [
        (DocumentKind::PositiveReview, record.reviews.positive),
        (DocumentKind::CriticalReview, record.reviews.critical),
    ];
    for (kind, reviews) in buckets {
        for (ordinal, review) in reviews.into_iter().enumerate() {
            let body = render_record(&review);
            if body.is_empty() {
                continue;
            }
            documents.push(
                Document::review(entity_id, kind, ordinal, &body, competitor).with_metadata(review),
            );
        }
    }
    documents
}

#[async_trait]
impl DocumentStore for CatalogDocumentStore {
    async fn fetch_subject_documents(&self, subject_id: &str) -> Vec<Document> {
        let documents = self.load_entity(subject_id, false).await;
        debug!("📦 商品 {} 共 {} 条文档", subject_id, documents.len());
        documents
    }

    async fn fetch_related_documents(
        &self,
        keyword: &str,
        excluding_subject_id: &str,
    ) -> RelatedDocuments {
        let path = self.catalog_dir.join("search_results.json");
        let Some(results) = Self::read_json::<Vec<SearchResult>>(&path).await else {
            return RelatedDocuments::new();
        };

        let Some(hit) = results
            .into_iter()
            .find(|r| r.keyword == keyword && r.excluded_id == excluding_subject_id)
        else {
            warn!("⚠️ 未找到关键词 '{}' 的竞品搜索结果", keyword);
            return RelatedDocuments::new();
        };

        let mut related = RelatedDocuments::new();
        for related_id in hit
            .related_ids
            .iter()
            .filter(|id| id.as_str() != excluding_subject_id)
            .take(self.max_related_entities)
        {
            let documents = self.load_entity(related_id, true).await;
            if !documents.is_empty() {
                related.insert(related_id.clone(), documents);
            }
        }
        related
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_catalog(dir: &Path) {
        std::fs::create_dir_all(dir.join("products")).unwrap();
        std::fs::write(
            dir.join("products/X1.json"),
            json!({
                "description": {"title": "Silent wireless mouse"},
                "reviews": {
                    "positive": [{"body": "Quiet clicks"}, "Long battery life"],
                    "critical": [{"body": "Scroll wheel squeaks"}]
                }
            })
            .to_string(),
        )
        .unwrap();
        for id in ["C1", "C2", "C3"] {
            std::fs::write(
                dir.join(format!("products/{}.json", id)),
                json!({"description": format!("Competitor {}", id)}).to_string(),
            )
            .unwrap();
        }
        std::fs::write(
            dir.join("search_results.json"),
            json!([
                {"keyword": "wireless mouse", "excluded_id": "X1", "related_ids": ["C1", "X1", "C2", "C3"]}
            ])
            .to_string(),
        )
        .unwrap();
    }

    fn store(dir: &Path, max_related_entities: usize) -> CatalogDocumentStore {
        CatalogDocumentStore::new(&StoreConfig {
            catalog_dir: dir.to_path_buf(),
            max_related_entities,
        })
    }

    #[tokio::test]
    async fn test_subject_documents() {
        let temp_dir = TempDir::new().unwrap();
        write_catalog(temp_dir.path());

        let documents = store(temp_dir.path(), 5).fetch_subject_documents("X1").await;
        assert_eq!(documents.len(), 4);
        assert_eq!(documents[0].kind, DocumentKind::Description);
        assert_eq!(documents[3].kind, DocumentKind::CriticalReview);
        assert!(documents[2].text.contains("Long battery life"));
    }

    #[tokio::test]
    async fn test_missing_subject_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let documents = store(temp_dir.path(), 5).fetch_subject_documents("nope").await;
        assert!(documents.is_empty());
    }

    #[tokio::test]
    async fn test_related_documents_limit_and_exclusion() {
        let temp_dir = TempDir::new().unwrap();
        write_catalog(temp_dir.path());

        let related = store(temp_dir.path(), 2)
            .fetch_related_documents("wireless mouse", "X1")
            .await;
        assert_eq!(related.keys().cloned().collect::<Vec<_>>(), vec!["C1", "C2"]);

        let none = store(temp_dir.path(), 5)
            .fetch_related_documents("keyboard", "X1")
            .await;
        assert!(none.is_empty());
    }
}
