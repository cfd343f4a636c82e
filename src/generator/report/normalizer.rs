//! 把模型输出的半结构化文本规范化为严格的报告结构
//!
//! 整个过程是全函数：任何输入都得到一个所有字段齐全的报告。

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

use super::{CompleteReport, Competitor, MainProduct, ProductSummary, Report};

static LEADING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```[A-Za-z0-9_-]*[ \t]*\r?\n?").unwrap());

/// 解析得到的部分报告，缺失或类型不对的字段为None
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PartialReport {
    pub description: Option<String>,
    pub main_problems: Option<String>,
    pub main_product_id: Option<String>,
    pub main_product_pros: Option<Vec<String>>,
    pub main_product_cons: Option<Vec<String>>,
    pub competitors: Option<Vec<Competitor>>,
    pub key_changes_for_sales: Option<Vec<String>>,
    pub product_analysis: Option<String>,
    pub competitor_analysis: Option<String>,
    pub recommendations: Option<String>,
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn string_field(object: Option<&Map<String, Value>>, keys: &[&str]) -> Option<String> {
    let object = object?;
    keys.iter()
        .find_map(|key| object.get(*key).and_then(scalar_string))
}

fn string_list(object: Option<&Map<String, Value>>, key: &str) -> Option<Vec<String>> {
    match object?.get(key)? {
        Value::Array(items) => Some(items.iter().filter_map(scalar_string).collect()),
        _ => None,
    }
}

fn competitor(value: &Value) -> Option<Competitor> {
    match value {
        Value::Object(object) => Some(Competitor {
            identifier: string_field(Some(object), &["identifier", "asin", "name"])
                .unwrap_or_default(),
            pros: string_list(Some(object), "pros").unwrap_or_default(),
            cons: string_list(Some(object), "cons").unwrap_or_default(),
        }),
        Value::String(identifier) => Some(Competitor {
            identifier: identifier.clone(),
            ..Default::default()
        }),
        _ => None,
    }
}

impl PartialReport {
    pub fn from_object(root: &Map<String, Value>) -> Self {
        let section = |key: &str| root.get(key).and_then(Value::as_object);
        let summary = section("product_summary");
        let main_product = section("main_product");
        let complete = section("complete_report");

        Self {
            description: string_field(summary, &["description"]),
            main_problems: string_field(summary, &["main_problems"]),
            main_product_id: string_field(main_product, &["id", "asin"]),
            main_product_pros: string_list(main_product, "pros"),
            main_product_cons: string_list(main_product, "cons"),
            competitors: match root.get("competitors") {
                Some(Value::Array(items)) => Some(items.iter().filter_map(competitor).collect()),
                _ => None,
            },
            key_changes_for_sales: string_list(Some(root), "key_changes_for_sales"),
            product_analysis: string_field(complete, &["product_analysis"]),
            competitor_analysis: string_field(complete, &["competitor_analysis"]),
            recommendations: string_field(complete, &["recommendations"]),
        }
    }
}

impl Report {
    /// 把部分报告合并到骨架上，缺失字段保留骨架的值
    pub fn merge(skeleton: Report, partial: PartialReport) -> Report {
        Report {
            product_summary: ProductSummary {
                description: partial
                    .description
                    .unwrap_or(skeleton.product_summary.description),
                main_problems: partial
                    .main_problems
                    .unwrap_or(skeleton.product_summary.main_problems),
            },
            main_product: MainProduct {
                id: partial.main_product_id.unwrap_or(skeleton.main_product.id),
                pros: partial.main_product_pros.unwrap_or(skeleton.main_product.pros),
                cons: partial.main_product_cons.unwrap_or(skeleton.main_product.cons),
            },
            competitors: partial.competitors.unwrap_or(skeleton.competitors),
            key_changes_for_sales: partial
                .key_changes_for_sales
                .unwrap_or(skeleton.key_changes_for_sales),
            complete_report: CompleteReport {
                product_analysis: partial
                    .product_analysis
                    .unwrap_or(skeleton.complete_report.product_analysis),
                competitor_analysis: partial
                    .competitor_analysis
                    .unwrap_or(skeleton.complete_report.competitor_analysis),
                recommendations: partial
                    .recommendations
                    .unwrap_or(skeleton.complete_report.recommendations),
            },
        }
    }
}

/// 报告规范化器
#[derive(Debug, Clone, Default)]
pub struct ReportNormalizer {
    skeleton: Report,
}

impl ReportNormalizer {
    pub fn new(skeleton: Report) -> Self {
        Self { skeleton }
    }

    /// 规范化模型输出，永不失败
    pub fn normalize(&self, raw: &str) -> Report {
        let cleaned = Self::clean(raw);
        let object = Self::parse_object_lenient(&cleaned);
        Report::merge(self.skeleton.clone(), PartialReport::from_object(&object))
    }

    /// 去掉首尾代码围栏以及 `//` 注释行
    pub fn clean(raw: &str) -> String {
        let mut text = raw.trim();
        if let Some(m) = LEADING_FENCE.find(text) {
            text = &text[m.end()..];
        }
        let text = text.trim_end();
        let text = text.strip_suffix("```").unwrap_or(text);

        text.lines()
            .filter(|line| !line.trim_start().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// 严格解析失败时依次尝试：最外层花括号片段、去掉尾随逗号；都失败则为空对象
    fn parse_object_lenient(text: &str) -> Map<String, Value> {
        let slice = match (text.find('{'), text.rfind('}')) {
            (Some(start), Some(end)) if start < end => Some(&text[start..=end]),
            _ => None,
        };

        let mut candidates: Vec<String> = vec![text.to_string()];
        candidates.extend(slice.map(str::to_string));
        let fixed: Vec<String> = candidates
            .iter()
            .map(|c| Self::strip_trailing_commas(c))
            .collect();
        candidates.extend(fixed);

        for candidate in &candidates {
            if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(candidate) {
                return object;
            }
        }
        tracing::warn!("⚠️ 报告JSON解析失败，使用默认结构");
        Map::new()
    }

    /// 删除紧跟 `}` 或 `]` 的逗号，字符串字面量内部保持原样
    fn strip_trailing_commas(text: &str) -> String {
        let mut output = String::with_capacity(text.len());
        let mut in_string = false;
        let mut escaped = false;

        for (i, c) in text.char_indices() {
            if in_string {
                match c {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => in_string = false,
                    _ => {}
                }
                output.push(c);
                continue;
            }

            match c {
                '"' => in_string = true,
                ',' => {
                    let rest = text[i + 1..].trim_start();
                    if rest.starts_with('}') || rest.starts_with(']') {
                        continue;
                    }
                }
                _ => {}
            }
            output.push(c);
        }
        output
    }
}
