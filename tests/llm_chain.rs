//! LLM provider chain tests against mock provider APIs.
//!
//! Each provider gets its own wiremock server so the chain order and the
//! per-provider request shapes can be checked independently.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scout::config::LlmConfig;
use scout::llm::{CompletionOptions, LlmProvider, Message, generate_completion};
use scout::scout_search::SearchError;

fn fast_options() -> CompletionOptions {
    CompletionOptions {
        max_retries: 0,
        timeout: Duration::from_secs(5),
        backoff_base: Duration::from_millis(1),
        ..Default::default()
    }
}

fn config_with(providers: &[(LlmProvider, &MockServer)]) -> LlmConfig {
    let mut config = LlmConfig {
        priority: providers.iter().map(|(p, _)| *p).collect(),
        ..Default::default()
    };
    for (provider, server) in providers {
        let creds = config.credentials_mut(*provider);
        creds.api_key = Some(format!("{provider}-key"));
        creds.base_url = Some(server.uri());
    }
    config
}

fn openai_body(content: &str) -> serde_json::Value {
    json!({
        "model": "gpt-4o-mini-2024-07-18",
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    })
}

#[tokio::test]
async fn every_provider_failing_exhausts_the_chain() {
    let openai = MockServer::start().await;
    let groq = MockServer::start().await;
    let mistral = MockServer::start().await;
    for server in [&openai, &groq, &mistral] {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": { "message": "upstream overloaded" }
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    let config = config_with(&[
        (LlmProvider::OpenAi, &openai),
        (LlmProvider::Groq, &groq),
        (LlmProvider::Mistral, &mistral),
    ]);
    let err = generate_completion(&config, &[Message::user("hello")], &fast_options())
        .await
        .unwrap_err();

    let SearchError::AllProvidersExhausted(failures) = &err else {
        panic!("expected exhaustion, got {err:?}");
    };
    assert_eq!(failures.len(), 3);
    assert!(failures[0].starts_with("openai"));
    assert!(failures[1].starts_with("groq"));
    assert!(failures[2].starts_with("mistral"));
    assert!(err.to_string().contains("upstream overloaded"));
}

#[tokio::test]
async fn falls_through_to_anthropic_with_json_prefill() {
    let openai = MockServer::start().await;
    let anthropic = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .expect(1)
        .mount(&openai)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "anthropic-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "claude-3-5-haiku-20241022",
            "content": [{ "type": "text", "text": "\"status\": \"ok\"}" }]
        })))
        .expect(1)
        .mount(&anthropic)
        .await;

    let config = config_with(&[(LlmProvider::OpenAi, &openai), (LlmProvider::Anthropic, &anthropic)]);
    let messages = [Message::system("You grade docs."), Message::user("status?")];
    let completion = generate_completion(&config, &messages, &fast_options().json())
        .await
        .expect("anthropic answers");

    assert_eq!(completion.provider_label, "anthropic");
    assert_eq!(completion.model_id, "claude-3-5-haiku-20241022");
    let value: serde_json::Value = serde_json::from_str(&completion.content).unwrap();
    assert_eq!(value["status"], "ok");
}

#[tokio::test]
async fn gemini_response_is_normalised() {
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .and(header("x-goog-api-key", "gemini-key"))
        .and(body_string_contains("systemInstruction"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "modelVersion": "gemini-1.5-flash-002",
            "candidates": [{ "content": { "parts": [{ "text": "Hello " }, { "text": "there" }] } }]
        })))
        .expect(1)
        .mount(&gemini)
        .await;

    let config = config_with(&[(LlmProvider::Gemini, &gemini)]);
    let messages = [Message::system("Be brief."), Message::user("greet me")];
    let completion = generate_completion(&config, &messages, &fast_options())
        .await
        .expect("gemini answers");

    assert_eq!(completion.provider_label, "gemini");
    assert_eq!(completion.model_id, "gemini-1.5-flash-002");
    assert_eq!(completion.content, "Hello there");
}

#[tokio::test]
async fn invalid_json_is_repaired_through_the_chain() {
    let openai = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("Fix this JSON"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_body("```json\n{\"score\": 0.9}\n```")))
        .expect(1)
        .mount(&openai)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("json_object"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_body("score is 0.9")))
        .expect(1)
        .mount(&openai)
        .await;

    let config = config_with(&[(LlmProvider::OpenAi, &openai)]);
    let completion = generate_completion(&config, &[Message::user("rate it")], &fast_options().json())
        .await
        .expect("repair succeeds");

    assert_eq!(completion.content, "{\"score\": 0.9}");
    assert_eq!(completion.provider_label, "openai");
}

#[tokio::test]
async fn repair_gives_up_after_configured_attempts() {
    let openai = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_body("definitely not json")))
        .expect(3)
        .mount(&openai)
        .await;

    let config = config_with(&[(LlmProvider::OpenAi, &openai)]);
    let err = generate_completion(&config, &[Message::user("rate it")], &fast_options().json())
        .await
        .unwrap_err();

    assert_eq!(err.code(), "MALFORMED_RESPONSE");
    assert!(err.to_string().contains("after 2 repair attempts"));
}

#[tokio::test]
async fn providers_without_keys_are_skipped() {
    let groq = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer groq-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_body("hi")))
        .expect(1)
        .mount(&groq)
        .await;

    let mut config = config_with(&[(LlmProvider::Groq, &groq)]);
    config.priority = LlmProvider::ALL.to_vec();
    let completion = generate_completion(&config, &[Message::user("hi")], &fast_options())
        .await
        .expect("groq answers");

    assert_eq!(completion.provider_label, "groq");
    assert_eq!(completion.content, "hi");
}
