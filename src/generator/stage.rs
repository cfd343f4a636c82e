use async_trait::async_trait;

use super::context::GeneratorContext;
use super::error::PipelineError;
use super::state::{DegradationReason, PipelineState, StageOutput};
use crate::index::RetrievedContext;
use crate::llm::CompletionError;
use crate::llm::client::utils::contains_placeholder;

/// 流水线中的一个阶段
#[async_trait]
pub trait PipelineStage: Send + Sync {
    /// 阶段标识
    fn name(&self) -> &'static str;

    /// 读取前序字段、检索上下文、调用模型并写入自己的字段
    ///
    /// 数据可用性问题写成降级值，只有需要中止整次运行的错误才返回Err。
    async fn execute(
        &self,
        context: &GeneratorContext,
        state: &mut PipelineState,
    ) -> Result<(), PipelineError>;
}

/// Prompt模板，`{name}` 形式的占位符在渲染时一次性替换
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    pub template: &'static str,
}

impl PromptTemplate {
    pub const fn new(template: &'static str) -> Self {
        Self { template }
    }

    /// 渲染模板；未提供的占位符与其它花括号原样保留
    ///
    /// 单遍扫描，替换进来的文本不会被再次展开。
    pub fn render(&self, vars: &[(&str, &str)]) -> String {
        let mut output = String::with_capacity(self.template.len());
        let mut rest = self.template;

        while let Some(open) = rest.find('{') {
            output.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let replacement = after.find('}').and_then(|close| {
                let name = &after[..close];
                vars.iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| (close, *value))
            });
            match replacement {
                Some((close, value)) => {
                    output.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    output.push('{');
                    rest = after;
                }
            }
        }
        output.push_str(rest);
        output
    }
}

/// 检索结果格式化
pub struct ContextFormatter {
    max_chars_per_document: usize,
}

impl ContextFormatter {
    pub fn new(max_chars_per_document: usize) -> Self {
        Self {
            max_chars_per_document,
        }
    }

    pub fn format(&self, context: &RetrievedContext) -> String {
        let mut content = String::new();
        for (i, retrieved) in context.iter().enumerate() {
            content.push_str(&format!(
                "[{}] ({}, relevance {:.3}) {}\n",
                i + 1,
                retrieved.document.entity_id,
                retrieved.score,
                self.truncate(&retrieved.document.text)
            ));
        }
        content
    }

    /// 按字符截断，保证不切断UTF-8字符
    fn truncate(&self, text: &str) -> String {
        match text.char_indices().nth(self.max_chars_per_document) {
            Some((byte_index, _)) => format!("{}...(truncated)", &text[..byte_index]),
            None => text.to_string(),
        }
    }
}

/// 调用模型：超时降级为哨兵，其它错误中止运行
pub async fn complete_or_degrade(
    context: &GeneratorContext,
    stage: &'static str,
    label: &str,
    prompt: &str,
) -> Result<StageOutput, PipelineError> {
    match context.completion.complete(prompt).await {
        Ok(text) => {
            if contains_placeholder(&text) {
                tracing::warn!("⚠️ [{}] 模型返回了占位内容: {}", stage, label);
            }
            Ok(StageOutput::Ready(text))
        }
        Err(CompletionError::Timeout { seconds }) => {
            tracing::warn!("⏱️ [{}] {} 超时 ({}秒)", stage, label, seconds);
            Ok(StageOutput::degraded(
                DegradationReason::CompletionTimeout,
                format!("{} timed out after {}s.", label, seconds),
            ))
        }
        Err(source) => {
            tracing::error!("❌ [{}] {} 调用失败: {}", stage, label, source);
            Err(PipelineError::Completion { stage, source })
        }
    }
}
