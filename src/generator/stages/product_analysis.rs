use async_trait::async_trait;

use crate::generator::context::GeneratorContext;
use crate::generator::error::PipelineError;
use crate::generator::recovery::load_with_recovery;
use crate::generator::stage::{ContextFormatter, PipelineStage, PromptTemplate, complete_or_degrade};
use crate::generator::state::{DegradationReason, PipelineState, StageOutput, StateField};
use crate::index::IndexHandle;

/// 主体商品索引的检索query
pub const PRODUCT_QUERY: &str = "product features, specifications, customer reviews";

const PRODUCT_ANALYSIS_PROMPT: PromptTemplate = PromptTemplate::new(
    r#"You are a product analyst tasked with evaluating a product based on its details and reviews.
Analyze the following product information and provide a comprehensive analysis:
1. Identify the key features and specifications of the product
2. Summarize the positive aspects mentioned in reviews
3. Summarize the negative aspects mentioned in reviews
4. Identify potential improvements based on customer feedback
5. Evaluate the overall customer satisfaction
Product context:
{context}
Provide a detailed analysis that helps understand the product's strengths and weaknesses."#,
);

/// 第一阶段：只基于主体商品自身的数据做分析
#[derive(Default)]
pub struct ProductAnalysisStage;

impl ProductAnalysisStage {
    const NAME: &'static str = "product_analysis";

    async fn analyze(
        &self,
        context: &GeneratorContext,
        subject_id: &str,
    ) -> Result<StageOutput, PipelineError> {
        let handle = IndexHandle::subject(subject_id);
        let index = match load_with_recovery(context, &handle).await {
            Ok(index) => index,
            Err(_) => {
                return Ok(StageOutput::degraded(
                    DegradationReason::IndexUnavailable,
                    format!("Could not load product index for {}.", subject_id),
                ));
            }
        };

        let retrieved = match index.retrieve(PRODUCT_QUERY, context.config.index.top_k).await {
            Ok(retrieved) => retrieved,
            Err(e) => {
                tracing::warn!("⚠️ 主体商品上下文检索失败: {}", e);
                return Ok(StageOutput::degraded(
                    DegradationReason::RetrievalFailed,
                    "Could not retrieve product context.",
                ));
            }
        };
        if retrieved.is_empty() {
            return Ok(StageOutput::degraded(
                DegradationReason::EmptyContext,
                "No context available for product analysis.",
            ));
        }
        tracing::debug!("主体商品上下文: {}条文档", retrieved.len());

        let formatter = ContextFormatter::new(context.config.index.max_chars_per_document);
        let prompt = PRODUCT_ANALYSIS_PROMPT.render(&[("context", &formatter.format(&retrieved))]);
        complete_or_degrade(context, Self::NAME, "Product analysis", &prompt).await
    }
}

#[async_trait]
impl PipelineStage for ProductAnalysisStage {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn execute(
        &self,
        context: &GeneratorContext,
        state: &mut PipelineState,
    ) -> Result<(), PipelineError> {
        let output = self.analyze(context, &state.subject_id).await?;
        state.set(Self::NAME, StateField::ProductAnalysis, output)
    }
}
