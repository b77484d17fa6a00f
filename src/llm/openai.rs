//! `OpenAI`-compatible chat-completions provider implementation

use super::types::{AssistantTurn, LlmRequest, Usage};
use super::{LlmError, LlmService};
use crate::transcript::{Message, ToolCall, ToolOutcome};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Service speaking the `OpenAI` chat-completions wire format. Works against
/// the hosted API or any compatible endpoint via `base_url`.
pub struct OpenAiService {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiService {
    pub fn new(api_key: String, model: String, base_url: &str, timeout: Duration) -> Self {
        let endpoint = format!("{}/chat/completions", base_url.trim_end_matches('/'));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key,
            model,
            endpoint,
        }
    }

    fn translate_request(&self, request: &LlmRequest) -> OpenAIRequest {
        let mut messages = Vec::new();

        if !request.system.is_empty() {
            messages.push(OpenAIMessage {
                role: "system".to_string(),
                content: Some(request.system.clone()),
                tool_calls: None,
                tool_call_id: None,
            });
        }

        let mut unanswered: Vec<String> = Vec::new();
        for msg in &request.messages {
            match msg {
                Message::ToolResult(result) => {
                    unanswered.retain(|id| id != &result.tool_call_id);
                }
                Message::User { .. }
                | Message::AssistantText { .. }
                | Message::AssistantToolRequest { .. } => {
                    Self::close_unanswered_calls(&mut messages, &mut unanswered);
                }
            }
            messages.push(Self::translate_message(msg));
            if let Message::AssistantToolRequest { tool_calls, .. } = msg {
                unanswered = tool_calls.iter().map(|call| call.id.clone()).collect();
            }
        }
        Self::close_unanswered_calls(&mut messages, &mut unanswered);

        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(
                request
                    .tools
                    .iter()
                    .map(|t| OpenAITool {
                        r#type: "function".to_string(),
                        function: OpenAIFunction {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            parameters: t.input_schema.clone(),
                        },
                    })
                    .collect(),
            )
        };

        OpenAIRequest {
            model: self.model.clone(),
            messages,
            tools,
            // Rulings must not vary between runs, so decoding is pinned.
            temperature: Some(0.0),
            stream: false,
        }
    }

    fn translate_message(msg: &Message) -> OpenAIMessage {
        match msg {
            Message::User { content } => OpenAIMessage {
                role: "user".to_string(),
                content: Some(content.clone()),
                tool_calls: None,
                tool_call_id: None,
            },
            Message::AssistantText { content } => OpenAIMessage {
                role: "assistant".to_string(),
                content: Some(content.clone()),
                tool_calls: None,
                tool_call_id: None,
            },
            Message::AssistantToolRequest {
                content,
                tool_calls,
            } => OpenAIMessage {
                role: "assistant".to_string(),
                content: content.clone(),
                tool_calls: Some(
                    tool_calls
                        .iter()
                        .map(|call| OpenAIToolCall {
                            id: call.id.clone(),
                            r#type: "function".to_string(),
                            function: OpenAIFunctionCall {
                                name: call.name.clone(),
                                arguments: serde_json::to_string(&call.arguments)
                                    .unwrap_or_else(|_| "{}".to_string()),
                            },
                        })
                        .collect(),
                ),
                tool_call_id: None,
            },
            Message::ToolResult(result) => OpenAIMessage {
                role: "tool".to_string(),
                content: Some(match &result.outcome {
                    ToolOutcome::Ok { payload } => serde_json::to_string(payload)
                        .unwrap_or_else(|_| "{}".to_string()),
                    ToolOutcome::Error { message } => format!("Error: {message}"),
                }),
                tool_calls: None,
                tool_call_id: Some(result.tool_call_id.clone()),
            },
        }
    }

    /// An aborted turn (cancellation, cycle cap) can leave a tool request in
    /// the history with no recorded results. The chat API rejects an
    /// assistant `tool_calls` entry whose calls were never answered, so each
    /// one gets a synthetic error reply on the wire; the stored history is
    /// not rewritten.
    fn close_unanswered_calls(messages: &mut Vec<OpenAIMessage>, unanswered: &mut Vec<String>) {
        for id in unanswered.drain(..) {
            messages.push(OpenAIMessage {
                role: "tool".to_string(),
                content: Some("Error: no result was recorded for this call".to_string()),
                tool_calls: None,
                tool_call_id: Some(id),
            });
        }
    }

    fn normalize_response(resp: OpenAIResponse) -> Result<AssistantTurn, LlmError> {
        let usage = Usage {
            input_tokens: u64::from(resp.usage.prompt_tokens),
            output_tokens: u64::from(resp.usage.completion_tokens),
        };

        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::protocol("No choices in response"))?;

        let content = choice.message.content.filter(|text| !text.is_empty());

        let mut tool_calls = Vec::new();
        if let Some(calls) = choice.message.tool_calls {
            for tc in calls {
                if tc.function.name.is_empty() {
                    continue;
                }

                let arguments = serde_json::from_str(&tc.function.arguments).unwrap_or_else(|e| {
                    tracing::warn!(
                        error = %e,
                        tool = %tc.function.name,
                        "Failed to parse tool call arguments, substituting empty object"
                    );
                    serde_json::json!({})
                });

                tool_calls.push(ToolCall {
                    id: tc.id,
                    name: tc.function.name,
                    arguments,
                });
            }
        }

        Ok(AssistantTurn {
            content,
            tool_calls,
            usage,
        })
    }

    fn error_from_status(
        status: reqwest::StatusCode,
        body: &str,
        retry_after: Option<Duration>,
    ) -> LlmError {
        let message = serde_json::from_str::<OpenAIErrorResponse>(body)
            .map_or_else(|_| body.to_string(), |resp| resp.error.message);

        match status.as_u16() {
            401 | 403 => LlmError::auth(format!("Authentication failed: {message}")),
            429 => {
                let err = LlmError::rate_limit(format!("Rate limit exceeded: {message}"));
                match retry_after {
                    Some(delay) => err.with_retry_after(delay),
                    None => err,
                }
            }
            400 => LlmError::invalid_request(format!("Invalid request: {message}")),
            500..=599 => LlmError::server_error(format!("Server error: {message}")),
            _ => LlmError::unknown(format!("HTTP {status}: {message}")),
        }
    }
}

#[async_trait]
impl LlmService for OpenAiService {
    async fn complete(&self, request: &LlmRequest) -> Result<AssistantTurn, LlmError> {
        let wire_request = self.translate_request(request);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&wire_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {e}"))
                } else {
                    LlmError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::error_from_status(status, &body, retry_after));
        }

        let wire_response: OpenAIResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::protocol(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        Self::normalize_response(wire_response)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct OpenAITool {
    r#type: String,
    function: OpenAIFunction,
}

#[derive(Debug, Serialize)]
struct OpenAIFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIToolCall {
    id: String,
    r#type: String,
    function: OpenAIFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: OpenAIUsage,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}
