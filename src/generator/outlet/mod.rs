use anyhow::{Context, Result};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::generator::error::PipelineError;
use crate::generator::workflow::PipelineRun;
use crate::index::sanitize;

pub mod summary_generator;

pub use summary_generator::SummaryContentGenerator;

/// 准备阶段失败时对外展示的消息
pub const PREPARATION_FAILED_MESSAGE: &str =
    "Failed to generate required embeddings. Analysis cannot proceed.";

/// 保存并展示一次运行的结果
pub async fn save(config: &Config, run: &PipelineRun) -> Result<()> {
    let disk = DiskOutlet::new(config.output_path.clone(), config.write_markdown);
    disk.save(run).await?;

    let console = ConsoleOutlet::new(config.json_output, disk.json_path(run));
    console.save(run).await
}

pub trait Outlet {
    async fn save(&self, run: &PipelineRun) -> Result<()>;
}

/// 报告文件名（不含扩展名）：`<subject>_<sanitized keyword>_analysis`
pub fn report_file_stem(subject_id: &str, keyword: &str) -> String {
    format!("{}_{}_analysis", sanitize(subject_id), sanitize(keyword))
}

/// 硬失败时打印的错误对象
pub fn error_object(error: &anyhow::Error) -> serde_json::Value {
    let message = match error.downcast_ref::<PipelineError>() {
        Some(PipelineError::Build(_)) => PREPARATION_FAILED_MESSAGE.to_string(),
        _ => error.to_string(),
    };
    json!({
        "error": true,
        "message": message,
        "detail": format!("{:#}", error),
    })
}

/// 把报告写入输出目录
pub struct DiskOutlet {
    output_dir: PathBuf,
    write_markdown: bool,
}

impl DiskOutlet {
    pub fn new(output_dir: PathBuf, write_markdown: bool) -> Self {
        Self {
            output_dir,
            write_markdown,
        }
    }

    pub fn json_path(&self, run: &PipelineRun) -> PathBuf {
        self.output_dir.join(format!(
            "{}.json",
            report_file_stem(&run.state.subject_id, &run.state.related_keyword)
        ))
    }

    pub fn markdown_path(&self, run: &PipelineRun) -> PathBuf {
        self.output_dir.join(format!(
            "{}.md",
            report_file_stem(&run.state.subject_id, &run.state.related_keyword)
        ))
    }

    fn write(path: &Path, content: &str) -> Result<()> {
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("💾 已保存报告: {}", path.display());
        Ok(())
    }
}

impl Outlet for DiskOutlet {
    async fn save(&self, run: &PipelineRun) -> Result<()> {
        tracing::info!("🖊️ 报告存储中...");
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create output directory {}", self.output_dir.display())
        })?;

        let json = serde_json::to_string_pretty(&run.report)?;
        Self::write(&self.json_path(run), &json)?;

        if self.write_markdown {
            Self::write(
                &self.markdown_path(run),
                &SummaryContentGenerator::markdown(run),
            )?;
        }
        Ok(())
    }
}

/// 标准输出：JSON模式只打印一个JSON文档，否则打印可读摘要
pub struct ConsoleOutlet {
    json_only: bool,
    report_path: PathBuf,
}

impl ConsoleOutlet {
    pub fn new(json_only: bool, report_path: PathBuf) -> Self {
        Self {
            json_only,
            report_path,
        }
    }
}

impl Outlet for ConsoleOutlet {
    async fn save(&self, run: &PipelineRun) -> Result<()> {
        if self.json_only {
            println!("{}", serde_json::to_string(&run.report)?);
        } else {
            print!(
                "{}",
                SummaryContentGenerator::console_summary(
                    &run.report,
                    &run.state.subject_id,
                    &self.report_path
                )
            );
        }
        Ok(())
    }
}
