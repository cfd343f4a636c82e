use anyhow::Result;
use std::time::{Duration, Instant};
use tracing::Instrument;
use uuid::Uuid;

use crate::cache::IndexCacheReport;
use crate::config::Config;
use crate::generator::context::GeneratorContext;
use crate::generator::error::PipelineError;
use crate::generator::outlet;
use crate::generator::report::{Report, ReportNormalizer};
use crate::generator::stage::PipelineStage;
use crate::generator::stages::{CompetitiveAnalysisStage, ProductAnalysisStage, ReportSynthesisStage};
use crate::generator::state::PipelineState;
use crate::index::{BuildError, IndexHandle, IndexStatus};

/// 时间跟踪作用域
pub struct TimingScope {
    start_time: Instant,
    phase_start_times: Vec<(String, Instant)>,
    phase_durations: Vec<(String, Duration)>,
}

impl Default for TimingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingScope {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            phase_start_times: Vec::new(),
            phase_durations: Vec::new(),
        }
    }

    /// 开始一个新的阶段计时
    pub fn start_phase(&mut self, phase_name: &str) {
        self.phase_start_times
            .push((phase_name.to_string(), Instant::now()));
    }

    /// 结束一个阶段的计时
    pub fn end_phase(&mut self, phase_name: &str) -> Option<Duration> {
        let position = self
            .phase_start_times
            .iter()
            .position(|(name, _)| name == phase_name)?;
        let (name, start_time) = self.phase_start_times.remove(position);
        let duration = start_time.elapsed();
        self.phase_durations.push((name, duration));
        Some(duration)
    }

    /// 获取总执行时间
    pub fn get_total_duration(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// 获取所有阶段的执行时间，按结束顺序
    pub fn get_phase_durations(&self) -> &[(String, Duration)] {
        &self.phase_durations
    }

    /// 获取格式化的执行时间报告
    pub fn generate_timing_report(&self) -> String {
        let mut report = format!(
            "总执行时间: {:.2}秒\n",
            self.get_total_duration().as_secs_f64()
        );

        if !self.phase_durations.is_empty() {
            report.push_str("\n各阶段执行时间:\n");
            for (phase, duration) in &self.phase_durations {
                report.push_str(&format!("- {}: {:.3}秒\n", phase, duration.as_secs_f64()));
            }
        }

        report
    }
}

/// 时间跟踪常量
pub struct TimingKeys;

impl TimingKeys {
    pub const PREPARE_INDICES: &'static str = "prepare_indices";
}

/// 一次完整运行的结果
pub struct PipelineRun {
    pub run_id: Uuid,
    pub state: PipelineState,
    pub report: Report,
    pub timing: TimingScope,
    pub cache: IndexCacheReport,
}

/// 流水线执行器：准备索引，严格按顺序执行各阶段，规范化最终报告
pub struct PipelineRunner {
    context: GeneratorContext,
    stages: Vec<Box<dyn PipelineStage>>,
}

impl PipelineRunner {
    pub fn new(context: GeneratorContext) -> Self {
        Self {
            context,
            stages: vec![
                Box::new(ProductAnalysisStage),
                Box::new(CompetitiveAnalysisStage),
                Box::new(ReportSynthesisStage),
            ],
        }
    }

    pub fn context(&self) -> &GeneratorContext {
        &self.context
    }

    /// 执行完整流程：准备索引 + 各阶段 + 报告规范化
    pub async fn run(&self, subject_id: &str, keyword: &str) -> Result<PipelineRun, PipelineError> {
        self.run_inner(subject_id, keyword, true).await
    }

    /// 跳过索引准备，直接在已有索引上执行各阶段
    pub async fn run_prepared(
        &self,
        subject_id: &str,
        keyword: &str,
    ) -> Result<PipelineRun, PipelineError> {
        self.run_inner(subject_id, keyword, false).await
    }

    async fn run_inner(
        &self,
        subject_id: &str,
        keyword: &str,
        prepare: bool,
    ) -> Result<PipelineRun, PipelineError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("run", %run_id, subject = subject_id, keyword = keyword);

        async move {
            let mut timing = TimingScope::new();
            let mut state = PipelineState::new(subject_id, keyword);

            if prepare {
                timing.start_phase(TimingKeys::PREPARE_INDICES);
                self.prepare_indices(subject_id, keyword).await?;
                timing.end_phase(TimingKeys::PREPARE_INDICES);
            }

            self.run_stages(&mut state, &mut timing).await?;
            let report = Self::finalize(&state);

            tracing::info!("✓ 分析流程执行完毕\n{}", timing.generate_timing_report());
            Ok::<_, PipelineError>(PipelineRun {
                run_id,
                state,
                report,
                timing,
                cache: self.context.indices.cache().monitor().generate_report(),
            })
        }
        .instrument(span)
        .await
    }

    /// 确保主体与关键词两个索引存在；force_rebuild时先删除
    pub async fn prepare_indices(
        &self,
        subject_id: &str,
        keyword: &str,
    ) -> Result<(IndexStatus, IndexStatus), PipelineError> {
        let indices = &self.context.indices;
        let subject = IndexHandle::subject(subject_id);
        let related = IndexHandle::related(keyword, subject_id);

        tracing::info!("🧮 准备向量索引...");
        if self.context.config.force_rebuild {
            for handle in [&subject, &related] {
                indices
                    .invalidate(&handle.key)
                    .await
                    .map_err(|source| BuildError::Io {
                        key: handle.key.clone(),
                        source,
                    })?;
            }
        }

        let statuses = tokio::try_join!(
            indices.ensure_index(&subject),
            indices.ensure_index(&related)
        )
        .inspect_err(|e| tracing::error!("❌ 索引准备失败: {}", e))?;
        tracing::info!("✅ 向量索引就绪");
        Ok(statuses)
    }

    /// 按顺序执行各阶段
    pub async fn run_stages(
        &self,
        state: &mut PipelineState,
        timing: &mut TimingScope,
    ) -> Result<(), PipelineError> {
        for stage in &self.stages {
            tracing::info!("🤖 执行 {} 阶段...", stage.name());
            timing.start_phase(stage.name());
            stage.execute(&self.context, state).await?;
            timing.end_phase(stage.name());
            tracing::info!("✓ {} 阶段完成", stage.name());
        }
        Ok(())
    }

    /// 规范化最终报告，并用流水线状态补全空缺字段
    pub fn finalize(state: &PipelineState) -> Report {
        let raw = state.final_report().as_ready().unwrap_or_default();
        let mut report = ReportNormalizer::new(Report::skeleton(&state.subject_id)).normalize(raw);

        if report.main_product.id.trim().is_empty() {
            report.main_product.id = state.subject_id.clone();
        }

        let complete = &mut report.complete_report;
        if complete.product_analysis.trim().is_empty() {
            complete.product_analysis = state.product_analysis().render();
        }
        if complete.competitor_analysis.trim().is_empty() {
            complete.competitor_analysis = state.competitor_analysis().render();
        }
        if complete.recommendations.trim().is_empty() {
            complete.recommendations = state.suggestions().render();
        }
        report
    }
}

/// 启动分析工作流
pub async fn launch(config: &Config, subject_id: &str, keyword: &str) -> Result<()> {
    let context = GeneratorContext::new(config.clone())?;
    let runner = PipelineRunner::new(context);

    let run = runner.run(subject_id, keyword).await?;
    outlet::save(config, &run).await
}
