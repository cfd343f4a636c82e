use crate::config::LLMConfig;

/// prompt超过该字节数时直接使用高质量模型
const EFFICIENT_MODEL_PROMPT_LIMIT: usize = 32 * 1024;

/// 按prompt长度选择模型，返回(首选模型, 备选模型)
pub fn evaluate_befitting_model(
    llm_config: &LLMConfig,
    system_prompt: &str,
    user_prompt: &str,
) -> (String, Option<String>) {
    if system_prompt.len() + user_prompt.len() <= EFFICIENT_MODEL_PROMPT_LIMIT
        && llm_config.model_efficient != llm_config.model_powerful
    {
        return (
            llm_config.model_efficient.clone(),
            Some(llm_config.model_powerful.clone()),
        );
    }
    if system_prompt.len() + user_prompt.len() <= EFFICIENT_MODEL_PROMPT_LIMIT {
        return (llm_config.model_efficient.clone(), None);
    }
    (llm_config.model_powerful.clone(), None)
}

/// 模型输出中提示"无法给出结论"的标记
const PLACEHOLDER_MARKERS: [&str; 2] = ["Unable to determine", "Placeholder"];

pub fn contains_placeholder(text: &str) -> bool {
    PLACEHOLDER_MARKERS.iter().any(|marker| text.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_prompt_prefers_efficient_model() {
        let config = LLMConfig::default();
        let (model, fallover) = evaluate_befitting_model(&config, "system", "short prompt");
        assert_eq!(model, config.model_efficient);
        assert_eq!(fallover, Some(config.model_powerful.clone()));
    }

    #[test]
    fn test_long_prompt_uses_powerful_model() {
        let config = LLMConfig::default();
        let long_prompt = "x".repeat(EFFICIENT_MODEL_PROMPT_LIMIT + 1);
        let (model, fallover) = evaluate_befitting_model(&config, "", &long_prompt);
        assert_eq!(model, config.model_powerful);
        assert!(fallover.is_none());
    }

    #[test]
    fn test_same_models_have_no_fallover() {
        let config = LLMConfig {
            model_efficient: "gpt-4o".to_string(),
            model_powerful: "gpt-4o".to_string(),
            ..Default::default()
        };
        let (model, fallover) = evaluate_befitting_model(&config, "s", "u");
        assert_eq!(model, "gpt-4o");
        assert!(fallover.is_none());
    }

    #[test]
    fn test_contains_placeholder() {
        assert!(contains_placeholder("Price: Unable to determine from context"));
        assert!(contains_placeholder("[Placeholder] pros"));
        assert!(!contains_placeholder("A solid, quiet mouse"));
    }
}
