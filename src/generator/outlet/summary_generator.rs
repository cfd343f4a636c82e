use std::fmt::Write as _;
use std::path::Path;

use crate::generator::report::Report;
use crate::generator::workflow::PipelineRun;

/// 每个竞品在摘要中展示的优缺点条数
const COMPETITOR_HIGHLIGHTS: usize = 3;

/// Summary内容生成器 - 负责格式化和组织报告内容
pub struct SummaryContentGenerator;

impl SummaryContentGenerator {
    /// 终端展示用的纯文本摘要
    pub fn console_summary(report: &Report, subject_id: &str, report_path: &Path) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\n==== PRODUCT ANALYSIS SUMMARY FOR {} ====\n", subject_id);
        let _ = writeln!(out, "PRODUCT SUMMARY:");
        let _ = writeln!(out, "Description: {}", report.product_summary.description);
        let _ = writeln!(out, "Main Problems: {}", report.product_summary.main_problems);

        let _ = writeln!(out, "\nMAIN PRODUCT PROS:");
        Self::numbered(&mut out, &report.main_product.pros, "", usize::MAX);
        let _ = writeln!(out, "\nMAIN PRODUCT CONS:");
        Self::numbered(&mut out, &report.main_product.cons, "", usize::MAX);

        let _ = writeln!(out, "\nCOMPETITOR PRODUCTS:");
        for (i, competitor) in report.competitors.iter().enumerate() {
            if competitor.identifier.is_empty() {
                let _ = writeln!(out, "\nCompetitor {}:", i + 1);
            } else {
                let _ = writeln!(out, "\nCompetitor {} ({}):", i + 1, competitor.identifier);
            }
            let _ = writeln!(out, "Top Pros:");
            Self::numbered(&mut out, &competitor.pros, "  ", COMPETITOR_HIGHLIGHTS);
            let _ = writeln!(out, "Top Cons:");
            Self::numbered(&mut out, &competitor.cons, "  ", COMPETITOR_HIGHLIGHTS);
        }

        let _ = writeln!(out, "\nKEY CHANGES NEEDED:");
        Self::numbered(&mut out, &report.key_changes_for_sales, "", usize::MAX);
        let _ = writeln!(out, "\nFull JSON report saved to {}", report_path.display());
        out
    }

    fn numbered(out: &mut String, items: &[String], indent: &str, limit: usize) {
        for (i, item) in items.iter().take(limit).enumerate() {
            let _ = writeln!(out, "{}{}. {}", indent, i + 1, item);
        }
    }

    fn bullets(out: &mut String, items: &[String]) {
        if items.is_empty() {
            let _ = writeln!(out, "_None reported._");
        }
        for item in items {
            let _ = writeln!(out, "- {}", item);
        }
    }

    /// 生成Markdown版本的完整报告，附带运行统计
    pub fn markdown(run: &PipelineRun) -> String {
        let report = &run.report;
        let mut content = String::new();

        content.push_str(&format!(
            "# Product Analysis: {} ({})\n\n",
            run.state.subject_id, run.state.related_keyword
        ));
        content.push_str(&format!(
            "生成时间: {}  \nRun: `{}`\n\n",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
            run.run_id
        ));

        content.push_str("## Product Summary\n\n");
        content.push_str(&format!(
            "**Description**: {}\n\n**Main problems**: {}\n\n",
            report.product_summary.description, report.product_summary.main_problems
        ));

        content.push_str(&format!("## Main Product `{}`\n\n", report.main_product.id));
        content.push_str("### Pros\n\n");
        Self::bullets(&mut content, &report.main_product.pros);
        content.push_str("\n### Cons\n\n");
        Self::bullets(&mut content, &report.main_product.cons);

        content.push_str("\n## Competitors\n\n");
        if report.competitors.is_empty() {
            content.push_str("_No competitors identified._\n");
        }
        for (i, competitor) in report.competitors.iter().enumerate() {
            content.push_str(&format!("### {}. {}\n\n", i + 1, competitor.identifier));
            content.push_str("**Pros**\n\n");
            Self::bullets(&mut content, &competitor.pros);
            content.push_str("\n**Cons**\n\n");
            Self::bullets(&mut content, &competitor.cons);
            content.push('\n');
        }

        content.push_str("\n## Key Changes for Sales\n\n");
        Self::bullets(&mut content, &report.key_changes_for_sales);

        let complete = &report.complete_report;
        content.push_str("\n## Complete Report\n\n");
        content.push_str(&format!(
            "### Product Analysis\n\n{}\n\n### Competitor Analysis\n\n{}\n\n### Recommendations\n\n{}\n\n",
            complete.product_analysis, complete.competitor_analysis, complete.recommendations
        ));

        content.push_str("## 执行耗时统计\n\n");
        content.push_str(&format!(
            "- **总执行时间**: {:.2} 秒\n",
            run.timing.get_total_duration().as_secs_f64()
        ));
        for (phase, duration) in run.timing.get_phase_durations() {
            content.push_str(&format!("- **{}**: {:.2} 秒\n", phase, duration.as_secs_f64()));
        }

        let cache = &run.cache;
        content.push_str("\n## 索引缓存统计\n\n");
        content.push_str(&format!("- **缓存命中率**: {:.1}%\n", cache.hit_rate * 100.0));
        content.push_str(&format!("- **缓存命中**: {} 次\n", cache.cache_hits));
        content.push_str(&format!("- **缓存未命中**: {} 次\n", cache.cache_misses));
        content.push_str(&format!("- **索引构建**: {} 次\n", cache.builds));
        content.push_str(&format!("- **嵌入文档数**: {}\n", cache.documents_embedded));
        if cache.invalidations > 0 {
            content.push_str(&format!("- **索引失效**: {} 次\n", cache.invalidations));
        }
        if cache.load_failures > 0 {
            content.push_str(&format!("- **加载失败**: {} 次\n", cache.load_failures));
        }

        content
    }
}
