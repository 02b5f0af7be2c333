//! Anthropic Messages API adapter.
//!
//! System messages move to the top-level `system` field. JSON mode adds a
//! system instruction and prefills the assistant turn with `{`; the prefill
//! is re-attached to the returned text so callers see a complete document.

use serde::Deserialize;

use scout_search::SearchError;
use scout_search::http::join_url;

use super::Completion;
use super::message::{Message, Role, system_text};
use super::provider::{ProviderSettings, RequestOptions, post_json};

/// API version header value.
const API_VERSION: &str = "2023-06-01";

const JSON_PREFILL: &str = "{";
const JSON_INSTRUCTION: &str = "Respond with a single valid JSON object and nothing else.";

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Build a Messages API request body. Returns the body and whether the
/// assistant turn was prefilled.
pub fn build_request(
    model: &str,
    messages: &[Message],
    options: &RequestOptions,
) -> (serde_json::Value, bool) {
    let mut turns: Vec<serde_json::Value> = messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| {
            serde_json::json!({
                "role": m.role.to_string(),
                "content": [{"type": "text", "text": m.content}],
            })
        })
        .collect();

    let mut system = system_text(messages);
    let prefill = options.json_mode && messages.last().is_some_and(|m| m.role != Role::Assistant);
    if options.json_mode {
        system = Some(match system {
            Some(text) => format!("{text}\n\n{JSON_INSTRUCTION}"),
            None => JSON_INSTRUCTION.to_string(),
        });
    }
    if prefill {
        turns.push(serde_json::json!({"role": "assistant", "content": JSON_PREFILL}));
    }

    let mut body = serde_json::json!({
        "model": model,
        "max_tokens": options.max_tokens,
        "messages": turns,
    });
    if let Some(system) = system {
        body["system"] = serde_json::Value::String(system);
    }
    if let Some(temp) = options.temperature {
        body["temperature"] = serde_json::json!(temp);
    }
    (body, prefill)
}

/// Send one completion request.
pub async fn complete(
    http: &reqwest::Client,
    settings: &ProviderSettings,
    messages: &[Message],
    options: &RequestOptions,
) -> Result<Completion, SearchError> {
    let (body, prefilled) = build_request(&settings.model, messages, options);
    let request = http
        .post(join_url(&settings.base_url, "/v1/messages"))
        .header("x-api-key", &settings.api_key)
        .header("anthropic-version", API_VERSION)
        .json(&body);

    let response: MessagesResponse = post_json(request, settings.provider).await?;
    let text: String = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect();
    if text.is_empty() && !prefilled {
        return Err(SearchError::MalformedResponse(
            "anthropic: response has no text content".into(),
        ));
    }

    Ok(Completion {
        content: reattach_prefill(prefilled, text),
        provider_label: settings.provider.name().to_string(),
        model_id: response.model.unwrap_or_else(|| settings.model.clone()),
    })
}

fn reattach_prefill(prefilled: bool, text: String) -> String {
    if prefilled && !text.trim_start().starts_with(JSON_PREFILL) {
        format!("{JSON_PREFILL}{text}")
    } else {
        text
    }
}
