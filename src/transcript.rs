//! Conversation state for one session.
//!
//! The transcript is an append-only log and the single source of truth for
//! what the reasoning service sees. Messages are a tagged union per kind, not
//! a loose role/content record; the flat chat wire format exists only inside
//! the reasoning client.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// One entry in a session's conversation log. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    User {
        content: String,
    },
    AssistantText {
        content: String,
    },
    AssistantToolRequest {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        tool_calls: Vec<ToolCall>,
    },
    ToolResult(ToolResult),
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }

    pub fn assistant_text(content: impl Into<String>) -> Self {
        Message::AssistantText {
            content: content.into(),
        }
    }

    pub fn assistant_tool_request(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Message::AssistantToolRequest {
            content,
            tool_calls,
        }
    }

    pub fn tool_result(result: ToolResult) -> Self {
        Message::ToolResult(result)
    }
}

/// A structured request from the reasoning service naming a registered tool.
/// `arguments` stays raw here; the registry schema-checks it before dispatch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// Settled outcome for one tool call, correlated by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResult {
    pub tool_call_id: String,
    #[serde(flatten)]
    pub outcome: ToolOutcome,
}

/// `ok` carries structured payload; `error` carries diagnostic text. A
/// validation verdict of "illegal" is a normal `ok` payload; only
/// infrastructure and argument failures are `error`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ToolOutcome {
    Ok { payload: Value },
    Error { message: String },
}

impl ToolOutcome {
    pub fn ok(payload: Value) -> Self {
        ToolOutcome::Ok { payload }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ToolOutcome::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolOutcome::Error { .. })
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TranscriptError {
    /// A tool result arrived whose id matches no open tool call. Either the
    /// call was never issued here or it was already resolved.
    #[error("tool result '{id}' does not correlate to an open tool call")]
    UnmatchedToolResult { id: String },
    /// An id was issued again while an earlier call with the same id was
    /// still unresolved.
    #[error("tool call id '{id}' is already open")]
    DuplicateToolCall { id: String },
}

/// Append-only message log for one session.
///
/// Exclusive ownership (`&mut` on append) is what serializes same-session
/// writes; independent sessions hold independent transcripts. The open-call
/// set enforces the correlation invariant: every tool result must match a
/// previously issued, still-unresolved call.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    open_calls: HashSet<String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one immutable message, preserving arrival order. There is no
    /// remove or update.
    pub fn append(&mut self, message: Message) -> Result<(), TranscriptError> {
        match &message {
            Message::AssistantToolRequest { tool_calls, .. } => {
                // Validate the whole batch before touching the open set, so a
                // rejected append leaves no half-registered calls behind.
                for (index, call) in tool_calls.iter().enumerate() {
                    let reissued = self.open_calls.contains(&call.id)
                        || tool_calls[..index].iter().any(|prior| prior.id == call.id);
                    if reissued {
                        return Err(TranscriptError::DuplicateToolCall {
                            id: call.id.clone(),
                        });
                    }
                }
                self.open_calls
                    .extend(tool_calls.iter().map(|call| call.id.clone()));
            }
            Message::ToolResult(result) => {
                if !self.open_calls.remove(&result.tool_call_id) {
                    return Err(TranscriptError::UnmatchedToolResult {
                        id: result.tool_call_id.clone(),
                    });
                }
            }
            Message::User { .. } | Message::AssistantText { .. } => {}
        }
        self.messages.push(message);
        Ok(())
    }

    /// The full ordered history, read-only.
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
