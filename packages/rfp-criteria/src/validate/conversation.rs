//! Turning research thread messages into plain conversation text.
//!
//! Message content arrives in several shapes (typed text parts, annotated
//! research output, bare strings), so extraction is a chain of strategies
//! tried in order. A strategy answers `Ok(None)` when it finds nothing and
//! `Err` when the content is not in a shape it understands; either way the
//! next strategy gets its turn.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{CriteriaError, Result};
use crate::types::validation::ThreadMessage;

/// Placeholder when no strategy found any text.
pub const NO_RESPONSE_CONTENT: &str = "No response content available from agent";

/// One way of reading conversation text out of thread messages.
pub trait ConversationStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// The conversation text, or `None` when there is none.
    fn extract(&self, messages: &[ThreadMessage]) -> Result<Option<String>>;
}

/// Every message as `[ROLE]: text`, read from typed text parts.
///
/// Fails on any message whose content is not a list of parts.
pub struct RoleTranscript;

impl ConversationStrategy for RoleTranscript {
    fn name(&self) -> &'static str {
        "role_transcript"
    }

    fn extract(&self, messages: &[ThreadMessage]) -> Result<Option<String>> {
        let mut parts = Vec::with_capacity(messages.len());
        for message in messages {
            let items = message.content.as_array().ok_or_else(|| {
                CriteriaError::upstream(format!(
                    "{} message content is not a list of parts",
                    message.role
                ))
            })?;

            let text = items
                .iter()
                .filter_map(part_text)
                .collect::<Vec<_>>()
                .join("\n");
            if !text.trim().is_empty() {
                parts.push(format!("[{}]: {}", role_prefix(&message.role), text));
            }
        }
        Ok(non_empty(parts.join("\n\n")))
    }
}

/// Only the assistant's typed text parts.
pub struct AssistantOnly;

impl ConversationStrategy for AssistantOnly {
    fn name(&self) -> &'static str {
        "assistant_only"
    }

    fn extract(&self, messages: &[ThreadMessage]) -> Result<Option<String>> {
        let texts: Vec<String> = messages
            .iter()
            .filter(|m| m.role.to_lowercase().contains("assistant"))
            .filter_map(|m| m.content.as_array())
            .flatten()
            .filter_map(|item| item.pointer("/text/value").and_then(Value::as_str))
            .map(str::to_string)
            .collect();
        Ok(non_empty(texts.join("\n\n")))
    }
}

/// First text found in each message, whatever the content shape.
pub struct ShapeTolerant;

impl ConversationStrategy for ShapeTolerant {
    fn name(&self) -> &'static str {
        "shape_tolerant"
    }

    fn extract(&self, messages: &[ThreadMessage]) -> Result<Option<String>> {
        let texts: Vec<String> = messages
            .iter()
            .filter_map(|m| any_text(&m.content))
            .filter(|t| !t.trim().is_empty())
            .collect();
        Ok(non_empty(texts.join("\n\n")))
    }
}

/// Runs strategies in order until one produces text.
pub struct ConversationExtractor {
    strategies: Vec<Box<dyn ConversationStrategy>>,
}

impl Default for ConversationExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationExtractor {
    /// The standard chain: role transcript, assistant only, shape tolerant.
    pub fn new() -> Self {
        Self::with_strategies(vec![
            Box::new(RoleTranscript),
            Box::new(AssistantOnly),
            Box::new(ShapeTolerant),
        ])
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ConversationStrategy>>) -> Self {
        Self { strategies }
    }

    /// Conversation text, or a placeholder explaining why there is none.
    pub fn extract(&self, messages: &[ThreadMessage]) -> String {
        let mut first_error = None;

        for strategy in &self.strategies {
            match strategy.extract(messages) {
                Ok(Some(text)) => {
                    debug!(strategy = strategy.name(), chars = text.len(), "Extracted conversation");
                    return text;
                }
                Ok(None) => debug!(strategy = strategy.name(), "Strategy found no content"),
                Err(e) => {
                    warn!(strategy = strategy.name(), error = %e, "Conversation strategy failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => format!("Error extracting response: {e}"),
            None => NO_RESPONSE_CONTENT.to_string(),
        }
    }
}

fn role_prefix(role: &str) -> String {
    let lower = role.to_lowercase();
    if lower.contains("user") {
        "USER".to_string()
    } else if lower.contains("assistant") {
        "ASSISTANT".to_string()
    } else {
        role.to_uppercase()
    }
}

/// Text of one content part, with cited URLs appended.
fn part_text(item: &Value) -> Option<String> {
    let text = match item.get("text") {
        Some(Value::Object(text)) => text.get("value").and_then(Value::as_str)?,
        Some(Value::String(text)) => text.as_str(),
        _ => item
            .get("value")
            .or_else(|| item.get("message"))
            .and_then(Value::as_str)?,
    };

    let citations: Vec<String> = item
        .pointer("/text/annotations")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|a| {
            let citation = a.get("url_citation")?;
            let url = citation.get("url").and_then(Value::as_str)?;
            let title = citation.get("title").and_then(Value::as_str).unwrap_or(url);
            Some(format!("[{title}]({url})"))
        })
        .filter(|c| !text.contains(c.as_str()))
        .collect();

    if citations.is_empty() {
        Some(text.to_string())
    } else {
        Some(format!("{text}\nSources:\n{}", citations.join("\n")))
    }
}

fn any_text(content: &Value) -> Option<String> {
    match content {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(any_text),
        Value::Object(map) => map
            .get("text")
            .or_else(|| map.get("value"))
            .or_else(|| map.get("message"))
            .and_then(any_text),
        other => Some(other.to_string()),
    }
}

fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_transcript_prefixes_roles() {
        let messages = vec![
            ThreadMessage::text("user", "Does it meet the criterion?"),
            ThreadMessage::text("assistant", "Yes."),
        ];
        let text = ConversationExtractor::new().extract(&messages);
        assert_eq!(text, "[USER]: Does it meet the criterion?\n\n[ASSISTANT]: Yes.");
    }

    #[test]
    fn test_citations_appended_once() {
        let messages = vec![ThreadMessage::new(
            "assistant",
            json!([{
                "type": "text",
                "text": {
                    "value": "Supported.",
                    "annotations": [
                        {"type": "url_citation", "url_citation": {"url": "https://example.com/a", "title": "A"}}
                    ]
                }
            }]),
        )];
        let text = RoleTranscript.extract(&messages).unwrap().unwrap();
        assert_eq!(text, "[ASSISTANT]: Supported.\nSources:\n[A](https://example.com/a)");
    }

    #[test]
    fn test_odd_shape_falls_through_to_tolerant_strategy() {
        let messages = vec![
            ThreadMessage::new("user", json!("plain string question")),
            ThreadMessage::new("assistant", json!({"text": {"value": "nested answer"}})),
        ];

        assert!(RoleTranscript.extract(&messages).is_err());
        assert_eq!(AssistantOnly.extract(&messages).unwrap(), None);
        assert_eq!(
            ConversationExtractor::new().extract(&messages),
            "plain string question\n\nnested answer"
        );
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(ConversationExtractor::new().extract(&[]), NO_RESPONSE_CONTENT);

        let failing = ConversationExtractor::with_strategies(vec![Box::new(RoleTranscript)]);
        let text = failing.extract(&[ThreadMessage::new("assistant", json!(42))]);
        assert!(text.starts_with("Error extracting response: "));
    }

    #[test]
    fn test_unknown_role_uppercased() {
        let text = RoleTranscript
            .extract(&[ThreadMessage::text("tool", "lookup result")])
            .unwrap();
        assert_eq!(text.as_deref(), Some("[TOOL]: lookup result"));
    }
}
