//! 文档来源 - 为主体商品与关联竞品提供原始文档

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub mod catalog;
pub mod memory;

pub use catalog::CatalogDocumentStore;
pub use memory::MemoryDocumentStore;

/// 文档类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Description,
    PositiveReview,
    CriticalReview,
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Description => write!(f, "description"),
            DocumentKind::PositiveReview => write!(f, "positive_review"),
            DocumentKind::CriticalReview => write!(f, "critical_review"),
        }
    }
}

/// 一条可被嵌入的原始文档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    /// 文档所属实体（商品id）
    pub entity_id: String,
    pub kind: DocumentKind,
    /// 用于嵌入与prompt的文本
    pub text: String,
    /// 原始记录，保留给下游展示
    #[serde(default)]
    pub metadata: Value,
}

impl Document {
    pub fn new(entity_id: &str, kind: DocumentKind, ordinal: usize, text: String) -> Self {
        Self {
            id: format!("{}:{}:{}", entity_id, kind, ordinal),
            entity_id: entity_id.to_string(),
            kind,
            text,
            metadata: Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// 由商品描述生成文档，主体与竞品使用不同的标签
    pub fn description(entity_id: &str, body: &str, competitor: bool) -> Self {
        let label = if competitor {
            format!("Competitor product {} description", entity_id)
        } else {
            format!("Product {} description", entity_id)
        };
        Self::new(
            entity_id,
            DocumentKind::Description,
            0,
            format!("{}: {}", label, body.trim()),
        )
    }

    /// 由单条评论生成文档
    pub fn review(
        entity_id: &str,
        kind: DocumentKind,
        ordinal: usize,
        body: &str,
        competitor: bool,
    ) -> Self {
        let tone = match kind {
            DocumentKind::CriticalReview => "critical",
            _ => "positive",
        };
        let label = if competitor {
            format!("Competitor {} customer review ({})", entity_id, tone)
        } else {
            format!("Product {} customer review ({})", entity_id, tone)
        };
        Self::new(entity_id, kind, ordinal, format!("{}: {}", label, body.trim()))
    }
}

/// 关联竞品文档，key为竞品id
pub type RelatedDocuments = BTreeMap<String, Vec<Document>>;

/// 原始文档来源
///
/// 查询失败时返回空集合，由调用方按"没有文档"处理。
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn fetch_subject_documents(&self, subject_id: &str) -> Vec<Document>;

    async fn fetch_related_documents(
        &self,
        keyword: &str,
        excluding_subject_id: &str,
    ) -> RelatedDocuments;
}

/// 将任意JSON记录压平成一段可读文本
pub fn render_record(record: &Value) -> String {
    match record {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Object(map) => {
            const PREFERRED: [&str; 6] = ["title", "rating", "text", "body", "content", "description"];
            let parts: Vec<String> = PREFERRED
                .iter()
                .filter_map(|key| map.get(*key).map(|v| (*key, v)))
                .filter_map(|(key, v)| match v {
                    Value::String(s) if !s.trim().is_empty() => Some(format!("{}: {}", key, s.trim())),
                    Value::Number(n) => Some(format!("{}: {}", key, n)),
                    _ => None,
                })
                .collect();
            if parts.is_empty() {
                record.to_string()
            } else {
                parts.join("; ")
            }
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_record_prefers_known_fields() {
        let record = json!({"_id": "abc", "title": "Great", "rating": 5, "body": "Works well"});
        assert_eq!(render_record(&record), "title: Great; rating: 5; body: Works well");
    }

    #[test]
    fn test_render_record_falls_back_to_json() {
        let record = json!({"foo": "bar"});
        assert_eq!(render_record(&record), r#"{"foo":"bar"}"#);
        assert_eq!(render_record(&json!("  plain  ")), "plain");
        assert_eq!(render_record(&Value::Null), "");
    }

    #[test]
    fn test_document_labels() {
        let doc = Document::review("B01", DocumentKind::CriticalReview, 2, "Broke fast", true);
        assert_eq!(doc.id, "B01:critical_review:2");
        assert!(doc.text.starts_with("Competitor B01 customer review (critical)"));

        let desc = Document::description("X1", "A mouse", false);
        assert_eq!(desc.text, "Product X1 description: A mouse");
    }
}
