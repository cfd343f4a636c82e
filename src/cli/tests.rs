#[cfg(test)]
mod tests {
    use crate::cli::Args;
    use crate::config::{EmbeddingProvider, LLMProvider};
    use clap::Parser;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_args_required_values() {
        assert!(Args::try_parse_from(["rivalscope-rs"]).is_err());
        assert!(Args::try_parse_from(["rivalscope-rs", "--asin", "X1"]).is_err());

        let args =
            Args::try_parse_from(["rivalscope-rs", "--asin", "X1", "--keyword", "mouse"]).unwrap();
        assert_eq!(args.asin, "X1");
        assert_eq!(args.keyword, "mouse");
        assert!(!args.json);
        assert!(!args.force_rebuild);
        assert!(!args.no_markdown);
        assert!(!args.verbose);
    }

    #[test]
    fn test_args_short_options_and_alias() {
        let args = Args::try_parse_from([
            "rivalscope-rs",
            "--subject-id",
            "X1",
            "-k",
            "wireless mouse",
            "-o",
            "/tmp/reports",
            "-v",
        ])
        .unwrap();

        assert_eq!(args.asin, "X1");
        assert_eq!(args.keyword, "wireless mouse");
        assert_eq!(args.output_path, Some(PathBuf::from("/tmp/reports")));
        assert!(args.verbose);
    }

    #[test]
    fn test_into_request_applies_overrides() {
        let request = Args::try_parse_from([
            "rivalscope-rs",
            "--asin",
            " X1 ",
            "--keyword",
            "mouse",
            "--json",
            "--force-rebuild",
            "--no-markdown",
            "--data-dir",
            "/tmp/idx",
            "--llm-provider",
            "openai",
            "--model-efficient",
            "gpt-4o-mini",
            "--top-k",
            "8",
            "--embedding-provider",
            "openai",
            "--timeout-seconds",
            "30",
        ])
        .unwrap()
        .into_request()
        .unwrap();

        assert_eq!(request.subject_id, "X1");
        assert_eq!(request.keyword, "mouse");
        let config = request.config;
        assert!(config.json_output);
        assert!(config.force_rebuild);
        assert!(config.recovery_enabled());
        assert!(!config.write_markdown);
        assert_eq!(config.index.data_dir, PathBuf::from("/tmp/idx"));
        assert_eq!(config.llm.provider, LLMProvider::OpenAI);
        assert_eq!(config.llm.model_efficient, "gpt-4o-mini");
        assert_eq!(config.index.top_k, 8);
        assert_eq!(config.embedding.provider, EmbeddingProvider::OpenAI);
        assert_eq!(config.llm.timeout_seconds, 30);
    }

    #[test]
    fn test_into_request_rejects_blank_inputs() {
        let blank_keyword = Args::try_parse_from(["rivalscope-rs", "--asin", "X1", "-k", "  "])
            .unwrap()
            .into_request();
        assert!(blank_keyword.is_err());

        let bad_provider = Args::try_parse_from([
            "rivalscope-rs",
            "--asin",
            "X1",
            "-k",
            "mouse",
            "--llm-provider",
            "nobody",
        ])
        .unwrap()
        .into_request();
        assert!(bad_provider.is_err());
    }

    #[test]
    fn test_into_request_reads_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
output_path = "/tmp/from-file"

[index]
top_k = 3
recover_on_load_failure = true
"#
        )
        .unwrap();

        let path = file.path().to_string_lossy().to_string();
        let request = Args::try_parse_from([
            "rivalscope-rs",
            "--asin",
            "X1",
            "-k",
            "mouse",
            "-c",
            &path,
        ])
        .unwrap()
        .into_request()
        .unwrap();

        assert_eq!(request.config.output_path, PathBuf::from("/tmp/from-file"));
        assert_eq!(request.config.index.top_k, 3);
        assert!(request.config.recovery_enabled());
        assert!(!request.config.force_rebuild);
    }

    #[test]
    fn test_into_request_missing_config_file_is_error() {
        let result = Args::try_parse_from([
            "rivalscope-rs",
            "--asin",
            "X1",
            "-k",
            "mouse",
            "-c",
            "/definitely/not/here.toml",
        ])
        .unwrap()
        .into_request();
        assert!(result.is_err());
    }
}
