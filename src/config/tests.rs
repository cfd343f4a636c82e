#[cfg(test)]
mod tests {
    use crate::config::{Config, EmbeddingProvider, IndexConfig, LLMConfig, LLMProvider, StoreConfig};
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.output_path, PathBuf::from("."));
        assert!(!config.json_output);
        assert!(!config.force_rebuild);
        assert!(config.write_markdown);
        assert!(!config.verbose);
        assert!(!config.recovery_enabled());
    }

    #[test]
    fn test_llm_provider_default() {
        let provider = LLMProvider::default();
        assert_eq!(provider, LLMProvider::Gemini);
    }

    #[test]
    fn test_llm_provider_from_str() {
        assert_eq!("openai".parse::<LLMProvider>().unwrap(), LLMProvider::OpenAI);
        assert_eq!("GEMINI".parse::<LLMProvider>().unwrap(), LLMProvider::Gemini);
        assert_eq!(
            "anthropic".parse::<LLMProvider>().unwrap(),
            LLMProvider::Anthropic
        );
        assert_eq!(
            "deepseek".parse::<LLMProvider>().unwrap(),
            LLMProvider::DeepSeek
        );
        assert_eq!("ollama".parse::<LLMProvider>().unwrap(), LLMProvider::Ollama);

        assert!("invalid".parse::<LLMProvider>().is_err());
    }

    #[test]
    fn test_llm_provider_display() {
        assert_eq!(LLMProvider::OpenAI.to_string(), "openai");
        assert_eq!(LLMProvider::Gemini.to_string(), "gemini");
        assert_eq!(LLMProvider::Anthropic.to_string(), "anthropic");
        assert_eq!(LLMProvider::DeepSeek.to_string(), "deepseek");
        assert_eq!(LLMProvider::Ollama.to_string(), "ollama");
    }

    #[test]
    fn test_llm_config_default() {
        let config = LLMConfig::default();

        assert_eq!(config.provider, LLMProvider::Gemini);
        assert!(!config.model_efficient.is_empty());
        assert!(!config.model_powerful.is_empty());
        assert_eq!(config.max_tokens, 8192);
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.timeout_seconds, 120);
    }

    #[test]
    fn test_index_and_store_defaults() {
        let index = IndexConfig::default();
        assert_eq!(index.data_dir, PathBuf::from("./data"));
        assert_eq!(index.top_k, 5);
        assert_eq!(index.min_score, 0.0);
        assert!(!index.recover_on_load_failure);

        let store = StoreConfig::default();
        assert_eq!(store.max_related_entities, 5);
    }

    #[test]
    fn test_embedding_provider_from_str() {
        assert_eq!(
            "hashing".parse::<EmbeddingProvider>().unwrap(),
            EmbeddingProvider::Hashing
        );
        assert_eq!(
            "OpenAI".parse::<EmbeddingProvider>().unwrap(),
            EmbeddingProvider::OpenAI
        );
        assert!("faiss".parse::<EmbeddingProvider>().is_err());
    }

    #[test]
    fn test_recovery_enabled() {
        let mut config = Config::default();
        config.force_rebuild = true;
        assert!(config.recovery_enabled());

        let mut config = Config::default();
        config.index.recover_on_load_failure = true;
        assert!(config.recovery_enabled());
    }

    #[test]
    fn test_config_from_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("rivalscope.toml");
        std::fs::write(
            &config_path,
            r#"
json_output = true

[llm]
provider = "openai"
model_efficient = "gpt-4o-mini"

[index]
data_dir = "/tmp/indices"
top_k = 3

[embedding]
provider = "openai"
dimension = 1536
"#,
        )
        .unwrap();

        let config = Config::from_file(&config_path).unwrap();
        assert!(config.json_output);
        assert_eq!(config.llm.provider, LLMProvider::OpenAI);
        assert_eq!(config.llm.model_efficient, "gpt-4o-mini");
        // 未写出的字段回落到默认值
        assert_eq!(config.llm.retry_attempts, 3);
        assert_eq!(config.index.data_dir, PathBuf::from("/tmp/indices"));
        assert_eq!(config.index.top_k, 3);
        assert_eq!(config.embedding.provider, EmbeddingProvider::OpenAI);
        assert_eq!(config.embedding.dimension, 1536);
        assert_eq!(config.store.max_related_entities, 5);
    }

    #[test]
    fn test_config_from_missing_file() {
        let result = Config::from_file(std::path::Path::new("/nonexistent/rivalscope.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_from_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("broken.toml");
        std::fs::write(&config_path, "[llm\nprovider = ").unwrap();

        assert!(Config::from_file(&config_path).is_err());
    }
}
