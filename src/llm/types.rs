//! Request and response types for the reasoning service.

use crate::transcript::{Message, ToolCall};
use serde_json::Value;

/// One reasoning request: fixed system instructions, the full conversation
/// snapshot, and the registered tool definitions.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub system: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
}

/// Wire-facing declaration of one registered tool. `input_schema` is a JSON
/// Schema document describing the arguments.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Exactly one new assistant message: optional text plus zero or more tool
/// calls.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantTurn {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Usage,
}

impl AssistantTurn {
    #[allow(dead_code)] // used in tests
    pub fn text(content: impl Into<String>) -> Self {
        AssistantTurn {
            content: Some(content.into()),
            tool_calls: Vec::new(),
            usage: Usage::default(),
        }
    }

    #[allow(dead_code)] // used in tests
    pub fn with_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        AssistantTurn {
            content,
            tool_calls,
            usage: Usage::default(),
        }
    }

    /// Folds the turn into its transcript form.
    pub fn into_message(self) -> Message {
        if self.tool_calls.is_empty() {
            Message::assistant_text(self.content.unwrap_or_default())
        } else {
            Message::assistant_tool_request(self.content, self.tool_calls)
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_turn_folds_to_assistant_text() {
        let message = AssistantTurn::text("the ruling stands").into_message();
        assert_eq!(message, Message::assistant_text("the ruling stands"));
    }

    #[test]
    fn tool_turn_folds_to_tool_request() {
        let call = ToolCall {
            id: "c1".into(),
            name: "search_cards".into(),
            arguments: json!({"query": "counterspell", "limit": 3}),
        };
        let message = AssistantTurn::with_tool_calls(Some("checking".into()), vec![call.clone()])
            .into_message();
        assert_eq!(
            message,
            Message::assistant_tool_request(Some("checking".into()), vec![call])
        );
    }

    #[test]
    fn empty_turn_folds_to_empty_text() {
        let turn = AssistantTurn {
            content: None,
            tool_calls: Vec::new(),
            usage: Usage::default(),
        };
        assert_eq!(turn.into_message(), Message::assistant_text(""));
    }
}
