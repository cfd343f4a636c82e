use async_trait::async_trait;

use crate::generator::context::GeneratorContext;
use crate::generator::error::PipelineError;
use crate::generator::recovery::load_with_recovery;
use crate::generator::stage::{ContextFormatter, PipelineStage, PromptTemplate, complete_or_degrade};
use crate::generator::state::{DegradationReason, PipelineState, StageOutput, StateField};
use crate::index::IndexHandle;
use crate::llm::CompletionError;

/// 竞品索引的检索query
pub const COMPETITOR_QUERY: &str = "competitor features, advantages, reviews";

const COMPETITOR_ANALYSIS_PROMPT: PromptTemplate = PromptTemplate::new(
    r#"You are a competitive market analyst. You need to compare a product with its competitors and identify key differences.
First, review the analysis of the main product:
{product_analysis}
Now, analyze the competitor information:
{competitor_context}
Provide a detailed analysis that:
1. Identifies unique features that competitors offer
2. Highlights areas where competitors are receiving positive reviews
3. Compares pricing and value proposition
4. Analyzes where competitors might be outperforming the main product
5. Identifies market gaps or opportunities
Focus on actionable insights about what competitors are doing differently."#,
);

const SUGGESTIONS_PROMPT: PromptTemplate = PromptTemplate::new(
    r#"You are a product strategy consultant. Based on the product analysis and competitive analysis, provide strategic recommendations.
Product analysis:
{product_analysis}
Competitor analysis:
{competitor_analysis}
Provide specific, actionable suggestions for:
1. Product improvements that would address customer pain points
2. Features that could be added to match or surpass competitors
3. Marketing angles that could highlight product strengths
4. Pricing or positioning strategies
5. Ways to better address customer needs identified in reviews
Each suggestion should be specific, practical, and directly tied to insights from the analysis."#,
);

/// 第二阶段：竞品分析 + 策略建议（两次有先后依赖的模型调用）
#[derive(Default)]
pub struct CompetitiveAnalysisStage;

struct CompetitiveOutputs {
    competitor_analysis: StageOutput,
    suggestions: StageOutput,
}

impl CompetitiveOutputs {
    fn both(reason: DegradationReason, analysis: &str, suggestions: &str) -> Self {
        Self {
            competitor_analysis: StageOutput::degraded(reason, analysis),
            suggestions: StageOutput::degraded(reason, suggestions),
        }
    }
}

impl CompetitiveAnalysisStage {
    const NAME: &'static str = "competitive_analysis";

    async fn analyze(
        &self,
        context: &GeneratorContext,
        state: &PipelineState,
        product_analysis: &str,
    ) -> Result<CompetitiveOutputs, PipelineError> {
        let subject_handle = IndexHandle::subject(&state.subject_id);
        let related_handle = IndexHandle::related(&state.related_keyword, &state.subject_id);

        let (subject_index, related_index) = tokio::join!(
            load_with_recovery(context, &subject_handle),
            load_with_recovery(context, &related_handle)
        );
        let related_index = match (subject_index, related_index) {
            (Ok(_), Ok(related_index)) => related_index,
            _ => {
                return Ok(CompetitiveOutputs::both(
                    DegradationReason::IndexUnavailable,
                    "Could not load indices.",
                    "Could not generate suggestions.",
                ));
            }
        };

        let retrieved = match related_index
            .retrieve(COMPETITOR_QUERY, context.config.index.top_k)
            .await
        {
            Ok(retrieved) => retrieved,
            Err(e) => {
                tracing::warn!("⚠️ 竞品上下文检索失败: {}", e);
                return Ok(CompetitiveOutputs::both(
                    DegradationReason::RetrievalFailed,
                    "Could not retrieve competitor context.",
                    "Could not retrieve competitor context for suggestions.",
                ));
            }
        };
        if retrieved.is_empty() {
            return Ok(CompetitiveOutputs::both(
                DegradationReason::EmptyContext,
                "No context available for competitor analysis.",
                "No context available for suggestions.",
            ));
        }
        tracing::debug!("竞品上下文: {}条文档", retrieved.len());

        let formatter = ContextFormatter::new(context.config.index.max_chars_per_document);
        let prompt = COMPETITOR_ANALYSIS_PROMPT.render(&[
            ("product_analysis", product_analysis),
            ("competitor_context", &formatter.format(&retrieved)),
        ]);
        let competitor_analysis =
            complete_or_degrade(context, Self::NAME, "Competitor analysis", &prompt).await?;

        let Some(competitor_text) = competitor_analysis.as_ready() else {
            return Ok(CompetitiveOutputs {
                competitor_analysis,
                suggestions: StageOutput::degraded(
                    DegradationReason::UpstreamUnavailable,
                    "Competitor analysis unavailable; suggestions skipped.",
                ),
            });
        };

        let prompt = SUGGESTIONS_PROMPT.render(&[
            ("product_analysis", product_analysis),
            ("competitor_analysis", competitor_text),
        ]);
        let suggestions = self.suggest(context, &prompt).await;

        Ok(CompetitiveOutputs {
            competitor_analysis,
            suggestions,
        })
    }

    /// 建议子调用的任何失败都降级，不中止运行
    async fn suggest(&self, context: &GeneratorContext, prompt: &str) -> StageOutput {
        match context.completion.complete(prompt).await {
            Ok(text) => StageOutput::Ready(text),
            Err(CompletionError::Timeout { seconds }) => {
                tracing::warn!("⏱️ [{}] 策略建议超时 ({}秒)", Self::NAME, seconds);
                StageOutput::degraded(
                    DegradationReason::CompletionTimeout,
                    format!("Suggestions timed out after {}s.", seconds),
                )
            }
            Err(e) => {
                tracing::warn!("⚠️ [{}] 策略建议生成失败: {}", Self::NAME, e);
                StageOutput::degraded(
                    DegradationReason::CompletionFailed,
                    "Could not generate suggestions.",
                )
            }
        }
    }
}

#[async_trait]
impl PipelineStage for CompetitiveAnalysisStage {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn execute(
        &self,
        context: &GeneratorContext,
        state: &mut PipelineState,
    ) -> Result<(), PipelineError> {
        let product_analysis = state.require(Self::NAME, StateField::ProductAnalysis)?;

        let outputs = match product_analysis.as_ready() {
            Some(text) => {
                let text = text.to_string();
                self.analyze(context, state, &text).await?
            }
            None => {
                tracing::warn!("⚠️ 主体商品分析不可用，跳过竞品分析");
                CompetitiveOutputs::both(
                    DegradationReason::UpstreamUnavailable,
                    "Product analysis unavailable; competitor analysis skipped.",
                    "Product analysis unavailable; suggestions skipped.",
                )
            }
        };

        state.set(
            Self::NAME,
            StateField::CompetitorAnalysis,
            outputs.competitor_analysis,
        )?;
        state.set(Self::NAME, StateField::Suggestions, outputs.suggestions)
    }
}
