pub mod competitive_analysis;
pub mod product_analysis;
pub mod report_synthesis;

pub use competitive_analysis::{COMPETITOR_QUERY, CompetitiveAnalysisStage};
pub use product_analysis::{PRODUCT_QUERY, ProductAnalysisStage};
pub use report_synthesis::ReportSynthesisStage;
