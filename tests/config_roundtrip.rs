//! Config file persistence tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use scout::config::ScoutConfig;
use scout::llm::LlmProvider;
use scout::scout_search::scoring::QualityMode;
use scout::tier::Plan;

#[test]
fn saved_config_loads_back_identical() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("config.toml");

    let mut config = ScoutConfig::default();
    config.llm.priority = vec![LlmProvider::Anthropic, LlmProvider::OpenAi];
    config.llm.anthropic.api_key = Some("sk-ant-test".into());
    config.llm.anthropic.model = Some("claude-3-5-sonnet-latest".into());
    config.llm.temperature = Some(0.25);
    config.retry.max_retries = 4;
    config.cache.ttl_secs = 120;
    config.aggregator.concurrency = 2;
    config.aggregator.quality_mode = QualityMode::CategoryWeighted;
    config.complexity.large_pages = 80;
    config.tiers.free.youtube = 3;

    config.save_to_file(&path).expect("save");
    let loaded = ScoutConfig::from_file(&path).expect("load");

    assert_eq!(loaded, config);
    assert_eq!(loaded.tiers.ceiling(Plan::Free).youtube, 3);
}

#[test]
fn sparse_file_keeps_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[retry]
timeout_ms = 2500

[llm.groq]
api_key = "gsk-test"
"#,
    )
    .expect("write");

    let config = ScoutConfig::from_file(&path).expect("load");

    assert_eq!(config.retry.timeout_ms, 2500);
    assert_eq!(config.retry.max_retries, 2);
    assert_eq!(config.cache.ttl_secs, 900);
    let providers = config.llm.configured_providers();
    assert_eq!(providers.len(), 1);
    assert_eq!(providers[0].provider, LlmProvider::Groq);
    assert_eq!(providers[0].model, "llama-3.3-70b-versatile");
    assert!(config.validate().is_ok());
}

#[test]
fn malformed_file_reports_toml_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[retry\ntimeout_ms = ").expect("write");

    let err = ScoutConfig::from_file(&path).unwrap_err();
    assert_eq!(err.code(), "TOML_INVALID");
}

#[test]
fn missing_file_reports_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = ScoutConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert_eq!(err.code(), "IO_ERROR");
}
