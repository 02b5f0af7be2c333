//! Cleaning and repairing structured LLM output.

use super::message::Message;

/// Strip a surrounding Markdown code fence (```` ```json ... ``` ````).
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`, `JSON`, ...) on the opening line.
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Return the JSON document contained in `text`.
///
/// Fences are stripped first. If the remainder still does not parse, the
/// outermost `{...}` or `[...]` span is tried, which recovers documents
/// wrapped in a sentence of prose.
///
/// # Errors
///
/// Returns the parse error of the stripped text when nothing parses.
pub fn extract_json(text: &str) -> Result<String, serde_json::Error> {
    let stripped = strip_code_fences(text);
    match serde_json::from_str::<serde_json::Value>(stripped) {
        Ok(_) => Ok(stripped.to_string()),
        Err(err) => {
            for (open, close) in [('{', '}'), ('[', ']')] {
                if let (Some(start), Some(end)) = (stripped.find(open), stripped.rfind(close))
                    && start < end
                {
                    let candidate = &stripped[start..=end];
                    if serde_json::from_str::<serde_json::Value>(candidate).is_ok() {
                        return Ok(candidate.to_string());
                    }
                }
            }
            Err(err)
        }
    }
}

/// Conversation asking the model to repair its own invalid output.
pub fn repair_messages(original: &[Message], invalid: &str, error: &str) -> Vec<Message> {
    let mut messages = original.to_vec();
    messages.push(Message::assistant(invalid));
    messages.push(Message::user(format!(
        "The previous response was not valid JSON ({error}). Fix this JSON and reply with only the corrected JSON document, no commentary."
    )));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::message::Role;

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n[1]\n```  "), "[1]");
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn single_line_fence() {
        assert_eq!(strip_code_fences("```{\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn unterminated_fence_keeps_body() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn extract_plain_and_fenced() {
        assert_eq!(extract_json("{\"ok\":true}").expect("json"), "{\"ok\":true}");
        assert_eq!(extract_json("```json\n{\"ok\":true}\n```").expect("json"), "{\"ok\":true}");
    }

    #[test]
    fn extract_from_prose() {
        let text = "Here is the result: {\"items\": [1, 2]} Hope that helps!";
        assert_eq!(extract_json(text).expect("json"), "{\"items\": [1, 2]}");
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(extract_json("{\"a\": 1,").is_err());
        assert!(extract_json("no json here").is_err());
    }

    #[test]
    fn repair_conversation_shape() {
        let original = vec![Message::system("s"), Message::user("give json")];
        let messages = repair_messages(&original, "{oops", "EOF while parsing");
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[2].content, "{oops");
        assert!(messages[3].content.contains("Fix this JSON"));
        assert!(messages[3].content.contains("EOF while parsing"));
    }
}
