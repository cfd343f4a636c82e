use thiserror::Error;

use crate::index::BuildError;
use crate::llm::CompletionError;

/// 整次运行中止的错误
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to prepare vector indices: {0}")]
    Build(#[from] BuildError),

    #[error("completion failed during {stage}: {source}")]
    Completion {
        stage: &'static str,
        #[source]
        source: CompletionError,
    },

    #[error("stage {stage} out of order: {detail}")]
    StageOrder { stage: &'static str, detail: String },
}
