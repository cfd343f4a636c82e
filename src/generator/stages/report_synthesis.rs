use async_trait::async_trait;

use crate::generator::context::GeneratorContext;
use crate::generator::error::PipelineError;
use crate::generator::report::Report;
use crate::generator::stage::{PipelineStage, PromptTemplate, complete_or_degrade};
use crate::generator::state::{DegradationReason, PipelineState, StageOutput, StateField};

const FINAL_REPORT_PROMPT: PromptTemplate = PromptTemplate::new(
    r#"You are creating a detailed product analysis report for ASIN: {asin} with search keyword: {keyword}.

Based on the provided analyses, create a structured report that follows this EXACT FORMAT:

1. Extract pros and cons for the main product AND for each competitor product
2. Identify key changes needed to increase sales for the main product
3. Create a brief product description and summary of the main problems
4. Format your complete analysis with clear sections

Use this information:

## Product Analysis
{product_analysis}

## Competitor Analysis
{competitor_analysis}

## Strategic Recommendations
{suggestions}

Your response MUST be structured as a valid JSON object with these exact keys:
{
    "product_summary": {
        "description": "Brief description of the main product",
        "main_problems": "Summary of key problems with the main product"
    },
    "main_product": {
        "id": "{asin}",
        "pros": ["Pro 1", "Pro 2", "Pro 3", "Pro 4", "Pro 5"],
        "cons": ["Con 1", "Con 2", "Con 3", "Con 4", "Con 5"]
    },
    "competitors": [
        {
            "identifier": "Competitor 1",
            "pros": ["Pro 1", "Pro 2", "Pro 3", "Pro 4", "Pro 5"],
            "cons": ["Con 1", "Con 2", "Con 3", "Con 4", "Con 5"]
        }
    ],
    "key_changes_for_sales": ["Change 1", "Change 2", "Change 3", "Change 4", "Change 5"],
    "complete_report": {
        "product_analysis": "Detailed analysis of the main product",
        "competitor_analysis": "Analysis of competitors",
        "recommendations": "Strategic recommendations"
    }
}

The JSON Schema of the expected object:
{schema}

Identify at least 3-5 competitor products from the competitor analysis and provide pros and cons for each.
Make sure your response is VALID JSON that can be parsed by a strict JSON parser."#,
);

/// 第三阶段：把前两阶段的结果合成为结构化JSON报告
#[derive(Default)]
pub struct ReportSynthesisStage;

impl ReportSynthesisStage {
    const NAME: &'static str = "report_synthesis";

    pub fn render_prompt(state: &PipelineState) -> String {
        FINAL_REPORT_PROMPT.render(&[
            ("asin", &state.subject_id),
            ("keyword", &state.related_keyword),
            ("product_analysis", state.product_analysis().prompt_text()),
            ("competitor_analysis", state.competitor_analysis().prompt_text()),
            ("suggestions", state.suggestions().prompt_text()),
            ("schema", &Report::json_schema()),
        ])
    }
}

#[async_trait]
impl PipelineStage for ReportSynthesisStage {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn execute(
        &self,
        context: &GeneratorContext,
        state: &mut PipelineState,
    ) -> Result<(), PipelineError> {
        let product_analysis = state.require(Self::NAME, StateField::ProductAnalysis)?;
        state.require(Self::NAME, StateField::CompetitorAnalysis)?;
        state.require(Self::NAME, StateField::Suggestions)?;

        let output = if product_analysis.is_degraded() {
            tracing::warn!("⚠️ 主体商品分析不可用，跳过报告合成");
            StageOutput::degraded(
                DegradationReason::UpstreamUnavailable,
                "Report synthesis skipped: product analysis unavailable.",
            )
        } else {
            let prompt = Self::render_prompt(state);
            complete_or_degrade(context, Self::NAME, "Report synthesis", &prompt).await?
        };

        state.set(Self::NAME, StateField::FinalReport, output)
    }
}
