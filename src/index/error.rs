use thiserror::Error;

use super::key::EntityKey;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("embedding request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("embedding service returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },

    #[error("invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },
}

/// 构建索引失败
#[derive(Error, Debug)]
pub enum BuildError {
    /// 实体没有任何已知文档
    #[error("no documents available for index {key}")]
    NoDocuments { key: EntityKey },

    #[error("failed to embed documents for index {key}: {source}")]
    Embedding {
        key: EntityKey,
        #[source]
        source: EmbeddingError,
    },

    #[error("failed to persist index {key}: {source}")]
    Io {
        key: EntityKey,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize index {key}: {source}")]
    Serialization {
        key: EntityKey,
        #[source]
        source: serde_json::Error,
    },
}

impl BuildError {
    pub fn key(&self) -> &EntityKey {
        match self {
            BuildError::NoDocuments { key }
            | BuildError::Embedding { key, .. }
            | BuildError::Io { key, .. }
            | BuildError::Serialization { key, .. } => key,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadFailureReason {
    Missing,
    Corrupt,
    /// 构建与加载时的格式或嵌入模型不一致
    VersionMismatch,
}

impl std::fmt::Display for LoadFailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadFailureReason::Missing => write!(f, "missing"),
            LoadFailureReason::Corrupt => write!(f, "corrupt"),
            LoadFailureReason::VersionMismatch => write!(f, "version mismatch"),
        }
    }
}

/// 加载索引失败
#[derive(Error, Debug, Clone)]
#[error("index {key} could not be loaded ({reason}): {detail}")]
pub struct LoadError {
    pub key: EntityKey,
    pub reason: LoadFailureReason,
    pub detail: String,
}

impl LoadError {
    pub fn new(key: &EntityKey, reason: LoadFailureReason, detail: impl Into<String>) -> Self {
        Self {
            key: key.clone(),
            reason,
            detail: detail.into(),
        }
    }
}
