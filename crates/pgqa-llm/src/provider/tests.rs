use super::*;
use pretty_assertions::assert_eq;

fn provider(base_url: Option<&str>) -> OpenAiProvider {
    OpenAiProvider::new(ProviderConfig {
        api_key: "sk-test".to_string(),
        model: "gpt-4o".to_string(),
        base_url: base_url.map(String::from),
        timeout: Duration::from_secs(5),
    })
    .expect("client builds")
}

#[test]
fn test_endpoint_defaults_to_openai() {
    let p = provider(None);
    assert_eq!(p.endpoint(), "https://api.openai.com/v1/chat/completions");
    assert_eq!(p.metadata().name, "OpenAI");
    assert!(p.is_available());
}

#[test]
fn test_custom_base_url() {
    assert_eq!(
        provider(Some("http://localhost:11434/v1/")).endpoint(),
        "http://localhost:11434/v1/chat/completions"
    );
    assert_eq!(
        provider(Some("https://llm.internal/v1/chat/completions")).endpoint(),
        "https://llm.internal/v1/chat/completions"
    );
    assert_eq!(provider(Some("  ")).endpoint(), "https://api.openai.com/v1/chat/completions");

    let meta = provider(Some("http://localhost:11434/v1")).metadata();
    assert_eq!(meta.name, "OpenAI-compatible");
    assert_eq!(meta.model, "gpt-4o");
}

#[test]
fn test_request_body_skips_unset_options() {
    let messages = vec![ChatMessage::user("Test")];
    let body = OpenAiRequest {
        model: "gpt-4o",
        messages: &messages,
        temperature: None,
        max_tokens: Some(1),
    };
    let value = serde_json::to_value(&body).expect("serializes");
    assert_eq!(
        value,
        serde_json::json!({
            "model": "gpt-4o",
            "messages": [{"role": "user", "content": "Test"}],
            "max_tokens": 1
        })
    );
}

#[tokio::test]
async fn test_noop_provider_is_unavailable() {
    let p = NoOpProvider;
    assert!(!p.is_available());
    let err = p.complete(ChatRequest::new(vec![])).await;
    assert!(matches!(err, Err(LlmError::ProviderUnavailable(_))));
}
