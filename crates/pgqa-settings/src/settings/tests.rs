//! Tests for settings layering

use super::*;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::io::Write;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_defaults() {
    let settings = Settings::default();
    assert_eq!(settings.database.url, DEFAULT_DATABASE_URL);
    assert_eq!(settings.llm.openai_model, "gpt-4o");
    assert_eq!(settings.analysis.max_query_length, 10_000);
    assert_eq!(settings.analysis.timeout, 30);
    assert!(!settings.analysis.enable_sql_security_check);
    assert_eq!(settings.bind_address(), "0.0.0.0:8000");
    assert!(!settings.llm.is_configured());
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(
        file,
        r#"
app_name = "Staging analyzer"

[server]
port = 9000

[analysis]
max_query_length = 500
"#
    )
    .expect("write");

    let settings = Settings::from_file(file.path()).expect("loads");
    assert_eq!(settings.app_name, "Staging analyzer");
    assert_eq!(settings.server.port, 9000);
    assert_eq!(settings.server.host, "0.0.0.0");
    assert_eq!(settings.analysis.max_query_length, 500);
    assert_eq!(settings.analysis.timeout, 30);
    assert_eq!(settings.llm, LlmSettings::default());
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = Settings::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(err.to_string().contains("Failed to read settings"));
}

#[test]
fn test_default_location_is_optional() {
    let no_config_dir = Settings::from_default_location(Err(anyhow::anyhow!(
        "Could not determine config directory"
    )))
    .expect("falls back to defaults");
    assert_eq!(no_config_dir, Settings::default());

    let dir = tempfile::tempdir().expect("temp dir");
    let absent = Settings::from_default_location(Ok(dir.path().join("settings.toml")))
        .expect("falls back to defaults");
    assert_eq!(absent, Settings::default());

    std::fs::write(dir.path().join("settings.toml"), "debug = true\n").expect("write");
    let present = Settings::from_default_location(Ok(dir.path().join("settings.toml")))
        .expect("loads");
    assert!(present.debug);
}

#[test]
fn test_invalid_toml_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "server = 12").expect("write");
    assert!(Settings::from_file(file.path()).is_err());
}

#[test]
fn test_env_overrides_file_values() {
    let mut settings = Settings::default();
    settings.server.port = 9000;

    settings
        .apply_env(env(&[
            ("PGQA_PORT", "8080"),
            ("DATABASE_URL", "postgresql://u:p@localhost:5433/app"),
            ("CORS_ORIGINS", "http://a.test, http://b.test"),
            ("ENABLE_SQL_SECURITY_CHECK", "true"),
            ("MAX_QUERY_LENGTH", "2000"),
            ("EXAMPLES_FILE", "/etc/pgqa/test_queries.json"),
            ("OPENAI_MODEL", ""),
        ]))
        .expect("valid env");

    assert_eq!(settings.server.port, 8080);
    assert_eq!(settings.database.url, "postgresql://u:p@localhost:5433/app");
    assert_eq!(settings.server.cors_origins, vec!["http://a.test", "http://b.test"]);
    assert!(settings.analysis.enable_sql_security_check);
    assert_eq!(settings.analysis.max_query_length, 2000);
    assert_eq!(
        settings.analysis.examples_file,
        Some(PathBuf::from("/etc/pgqa/test_queries.json"))
    );
    // Empty values are ignored
    assert_eq!(settings.llm.openai_model, "gpt-4o");
}

#[test]
fn test_cors_origins_as_json_array() {
    let mut settings = Settings::default();
    settings
        .apply_env(env(&[("CORS_ORIGINS", r#"["http://x.test"]"#)]))
        .expect("valid env");
    assert_eq!(settings.server.cors_origins, vec!["http://x.test"]);
}

#[test]
fn test_invalid_env_values() {
    let mut settings = Settings::default();
    assert_eq!(
        settings.apply_env(env(&[("PGQA_PORT", "eighty")])),
        Err(SettingsError::InvalidEnv {
            var: "PGQA_PORT",
            value: "eighty".to_string(),
            expected: "a non-negative integer",
        })
    );
    assert!(settings.apply_env(env(&[("DEBUG", "maybe")])).is_err());
}

#[test]
fn test_custom_llm_takes_precedence() {
    let mut settings = Settings::default();
    settings
        .apply_env(env(&[
            ("OPENAI_API_KEY", "sk-openai"),
            ("LLM_URL", "http://localhost:11434/v1"),
            ("LLM_MODEL", "llama3"),
        ]))
        .expect("valid env");

    let llm = settings.llm.effective();
    assert_eq!(llm.base_url.as_deref(), Some("http://localhost:11434/v1"));
    assert_eq!(llm.model, "llama3");
    // No custom key, falls back to the OpenAI key
    assert_eq!(llm.api_key, "sk-openai");
    assert_eq!(llm.timeout, Duration::from_secs(60));
    assert!(settings.llm.is_configured());
}
