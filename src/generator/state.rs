//! 单次运行的流水线状态

use super::error::PipelineError;

/// 哨兵字符串前缀
pub const SENTINEL_PREFIX: &str = "Error: ";

/// 下游prompt中代替不可用输入的文本
pub const NOT_AVAILABLE: &str = "Not available.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradationReason {
    /// 索引无法加载（未开启恢复或恢复失败）
    IndexUnavailable,
    /// 检索成功但没有结果
    EmptyContext,
    /// 查询嵌入失败
    RetrievalFailed,
    /// 上游阶段已降级
    UpstreamUnavailable,
    CompletionTimeout,
    CompletionFailed,
}

/// 阶段内可恢复的失败
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Degradation {
    pub reason: DegradationReason,
    pub message: String,
}

impl Degradation {
    pub fn new(reason: DegradationReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }

    /// 渲染为对外兼容的哨兵字符串
    pub fn sentinel(&self) -> String {
        format!("{}{}", SENTINEL_PREFIX, self.message)
    }
}

/// 一个状态字段的值
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StageOutput {
    #[default]
    Pending,
    Ready(String),
    Degraded(Degradation),
}

impl StageOutput {
    pub fn degraded(reason: DegradationReason, message: impl Into<String>) -> Self {
        StageOutput::Degraded(Degradation::new(reason, message))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, StageOutput::Pending)
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, StageOutput::Degraded(_))
    }

    pub fn as_ready(&self) -> Option<&str> {
        match self {
            StageOutput::Ready(text) => Some(text),
            _ => None,
        }
    }

    pub fn degradation(&self) -> Option<&Degradation> {
        match self {
            StageOutput::Degraded(d) => Some(d),
            _ => None,
        }
    }

    /// 序列化边界上的文本形式
    pub fn render(&self) -> String {
        match self {
            StageOutput::Pending => String::new(),
            StageOutput::Ready(text) => text.clone(),
            StageOutput::Degraded(d) => d.sentinel(),
        }
    }

    /// 写入下游prompt的文本，不可用时不传递哨兵
    pub fn prompt_text(&self) -> &str {
        match self {
            StageOutput::Ready(text) => text,
            _ => NOT_AVAILABLE,
        }
    }
}

/// 按阶段顺序逐个写入的运行状态
///
/// 每个字段只能写一次；读取未写入的字段属于阶段顺序错误。
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub subject_id: String,
    pub related_keyword: String,
    product_analysis: StageOutput,
    competitor_analysis: StageOutput,
    suggestions: StageOutput,
    final_report: StageOutput,
}

/// 状态字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateField {
    ProductAnalysis,
    CompetitorAnalysis,
    Suggestions,
    FinalReport,
}

impl std::fmt::Display for StateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateField::ProductAnalysis => write!(f, "product_analysis"),
            StateField::CompetitorAnalysis => write!(f, "competitor_analysis"),
            StateField::Suggestions => write!(f, "suggestions"),
            StateField::FinalReport => write!(f, "final_report"),
        }
    }
}

impl PipelineState {
    pub fn new(subject_id: &str, related_keyword: &str) -> Self {
        Self {
            subject_id: subject_id.to_string(),
            related_keyword: related_keyword.to_string(),
            product_analysis: StageOutput::Pending,
            competitor_analysis: StageOutput::Pending,
            suggestions: StageOutput::Pending,
            final_report: StageOutput::Pending,
        }
    }

    pub fn get(&self, field: StateField) -> &StageOutput {
        match field {
            StateField::ProductAnalysis => &self.product_analysis,
            StateField::CompetitorAnalysis => &self.competitor_analysis,
            StateField::Suggestions => &self.suggestions,
            StateField::FinalReport => &self.final_report,
        }
    }

    pub fn product_analysis(&self) -> &StageOutput {
        &self.product_analysis
    }

    pub fn competitor_analysis(&self) -> &StageOutput {
        &self.competitor_analysis
    }

    pub fn suggestions(&self) -> &StageOutput {
        &self.suggestions
    }

    pub fn final_report(&self) -> &StageOutput {
        &self.final_report
    }

    /// 读取依赖字段，未写入时返回阶段顺序错误
    pub fn require(
        &self,
        stage: &'static str,
        field: StateField,
    ) -> Result<&StageOutput, PipelineError> {
        let value = self.get(field);
        if value.is_pending() {
            return Err(PipelineError::StageOrder {
                stage,
                detail: format!("{} has not been populated", field),
            });
        }
        Ok(value)
    }

    /// 写入字段，每个字段只允许写一次
    pub fn set(
        &mut self,
        stage: &'static str,
        field: StateField,
        value: StageOutput,
    ) -> Result<(), PipelineError> {
        let slot = match field {
            StateField::ProductAnalysis => &mut self.product_analysis,
            StateField::CompetitorAnalysis => &mut self.competitor_analysis,
            StateField::Suggestions => &mut self.suggestions,
            StateField::FinalReport => &mut self.final_report,
        };
        if !slot.is_pending() {
            return Err(PipelineError::StageOrder {
                stage,
                detail: format!("{} was already written", field),
            });
        }
        *slot = value;
        Ok(())
    }
}
