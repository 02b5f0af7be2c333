//! OpenAI Chat Completions adapter.
//!
//! Also serves every OpenAI-compatible provider (Groq, Mistral,
//! OpenRouter): same path, same Bearer auth, same response shape.
//! JSON mode sets `response_format: {"type": "json_object"}`.

use serde::Deserialize;

use scout_search::SearchError;
use scout_search::http::join_url;

use super::Completion;
use super::message::Message;
use super::provider::{ProviderSettings, RequestOptions, post_json};

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Build a Chat Completions request body.
pub fn build_request(model: &str, messages: &[Message], options: &RequestOptions) -> serde_json::Value {
    let messages: Vec<serde_json::Value> = messages
        .iter()
        .map(|m| serde_json::json!({"role": m.role.to_string(), "content": m.content}))
        .collect();

    let mut body = serde_json::json!({
        "model": model,
        "messages": messages,
        "max_tokens": options.max_tokens,
    });

    if let Some(temp) = options.temperature {
        body["temperature"] = serde_json::json!(temp);
    }
    if options.json_mode {
        body["response_format"] = serde_json::json!({"type": "json_object"});
    }
    body
}

/// Send one completion request.
pub async fn complete(
    http: &reqwest::Client,
    settings: &ProviderSettings,
    messages: &[Message],
    options: &RequestOptions,
) -> Result<Completion, SearchError> {
    let body = build_request(&settings.model, messages, options);
    let request = http
        .post(join_url(&settings.base_url, "/v1/chat/completions"))
        .bearer_auth(&settings.api_key)
        .json(&body);

    let response: ChatResponse = post_json(request, settings.provider).await?;
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| {
            SearchError::MalformedResponse(format!("{}: response has no message content", settings.provider))
        })?;

    Ok(Completion {
        content,
        provider_label: settings.provider.name().to_string(),
        model_id: response.model.unwrap_or_else(|| settings.model.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_basic() {
        let body = build_request(
            "gpt-4o-mini",
            &[Message::system("be brief"), Message::user("hi")],
            &RequestOptions::default(),
        );
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
        assert_eq!(body["max_tokens"], 4096);
        assert!(body.get("response_format").is_none());
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn request_json_mode() {
        let options = RequestOptions {
            json_mode: true,
            temperature: Some(0.2),
            ..Default::default()
        };
        let body = build_request("m", &[Message::user("json please")], &options);
        assert_eq!(body["response_format"]["type"], "json_object");
        assert!(body["temperature"].as_f64().is_some());
    }
}
