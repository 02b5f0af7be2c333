//! Gemini `generateContent` adapter.

use serde::Deserialize;

use scout_search::SearchError;
use scout_search::http::join_url;

use super::Completion;
use super::message::{Message, Role, system_text};
use super::provider::{ProviderSettings, RequestOptions, post_json};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    candidates: Vec<Candidate>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

/// Build a `generateContent` request body.
pub fn build_request(messages: &[Message], options: &RequestOptions) -> serde_json::Value {
    let contents: Vec<serde_json::Value> = messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| {
            let role = if m.role == Role::Assistant { "model" } else { "user" };
            serde_json::json!({"role": role, "parts": [{"text": m.content}]})
        })
        .collect();

    let mut generation = serde_json::json!({"maxOutputTokens": options.max_tokens});
    if let Some(temp) = options.temperature {
        generation["temperature"] = serde_json::json!(temp);
    }
    if options.json_mode {
        generation["responseMimeType"] = serde_json::json!("application/json");
    }

    let mut body = serde_json::json!({
        "contents": contents,
        "generationConfig": generation,
    });
    if let Some(system) = system_text(messages) {
        body["systemInstruction"] = serde_json::json!({"parts": [{"text": system}]});
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
    let path = format!("/v1beta/models/{}:generateContent", settings.model);
    let request = http
        .post(join_url(&settings.base_url, &path))
        .header("x-goog-api-key", &settings.api_key)
        .json(&build_request(messages, options));

    let response: GenerateResponse = post_json(request, settings.provider).await?;
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.is_empty() {
        return Err(SearchError::MalformedResponse(
            "gemini: response has no candidate text".into(),
        ));
    }

    Ok(Completion {
        content: text,
        provider_label: settings.provider.name().to_string(),
        model_id: response.model_version.unwrap_or_else(|| settings.model.clone()),
    })
}
