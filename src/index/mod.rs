//! 向量索引：实体key、嵌入、构建与检索

pub mod builder;
pub mod embedding;
pub mod error;
pub mod key;
pub mod vector_index;

pub use builder::{IndexStatus, VectorIndexBuilder};
pub use embedding::{Embedder, HashingEmbedder, HttpEmbedder, build_embedder};
pub use error::{BuildError, EmbeddingError, LoadError, LoadFailureReason};
pub use key::{DocumentSource, EntityKey, IndexHandle, sanitize};
pub use vector_index::{RetrievedContext, RetrievedDocument, VectorIndex};
