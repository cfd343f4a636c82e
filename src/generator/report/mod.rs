//! 最终报告的严格结构

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub mod normalizer;

pub use normalizer::ReportNormalizer;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ProductSummary {
    /// 主体商品的简要描述
    pub description: String,
    /// 主体商品主要问题的总结
    pub main_problems: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MainProduct {
    /// 主体商品id（ASIN）
    pub id: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Competitor {
    /// 竞品标识（ASIN或名称）
    pub identifier: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CompleteReport {
    pub product_analysis: String,
    pub competitor_analysis: String,
    pub recommendations: String,
}

/// 规范化后的报告，所有字段始终存在
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Report {
    pub product_summary: ProductSummary,
    pub main_product: MainProduct,
    pub competitors: Vec<Competitor>,
    /// 提升销量所需的关键改变
    pub key_changes_for_sales: Vec<String>,
    pub complete_report: CompleteReport,
}

impl Report {
    /// 主体商品id的默认骨架
    pub fn skeleton(subject_id: &str) -> Self {
        Self {
            main_product: MainProduct {
                id: subject_id.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// 报告的JSON Schema，嵌入合成阶段的prompt
    pub fn json_schema() -> String {
        let schema = schemars::schema_for!(Report);
        serde_json::to_string_pretty(&schema).unwrap_or_default()
    }
}
