use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{Document, DocumentStore, RelatedDocuments};

/// 进程内文档来源，记录被查询的次数
#[derive(Default)]
pub struct MemoryDocumentStore {
    subjects: Mutex<HashMap<String, Vec<Document>>>,
    related: Mutex<HashMap<(String, String), RelatedDocuments>>,
    subject_fetches: AtomicUsize,
    related_fetches: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_subject(&self, subject_id: &str, documents: Vec<Document>) {
        if let Ok(mut subjects) = self.subjects.lock() {
            subjects.insert(subject_id.to_string(), documents);
        }
    }

    pub fn insert_related(&self, keyword: &str, excluding_subject_id: &str, related: RelatedDocuments) {
        if let Ok(mut map) = self.related.lock() {
            map.insert(
                (keyword.to_string(), excluding_subject_id.to_string()),
                related,
            );
        }
    }

    pub fn subject_fetches(&self) -> usize {
        self.subject_fetches.load(Ordering::Relaxed)
    }

    pub fn related_fetches(&self) -> usize {
        self.related_fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn fetch_subject_documents(&self, subject_id: &str) -> Vec<Document> {
        self.subject_fetches.fetch_add(1, Ordering::Relaxed);
        self.subjects
            .lock()
            .ok()
            .and_then(|subjects| subjects.get(subject_id).cloned())
            .unwrap_or_default()
    }

    async fn fetch_related_documents(
        &self,
        keyword: &str,
        excluding_subject_id: &str,
    ) -> RelatedDocuments {
        self.related_fetches.fetch_add(1, Ordering::Relaxed);
        self.related
            .lock()
            .ok()
            .and_then(|map| {
                map.get(&(keyword.to_string(), excluding_subject_id.to_string()))
                    .cloned()
            })
            .unwrap_or_default()
    }
}
