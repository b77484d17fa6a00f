//! Tool implementations for the judge agent
//!
//! Tools are stateless singletons; anything they need (rules engine, search
//! client) is injected at construction.

mod judge;
mod librarian;

pub use judge::{ApplyActionTool, CheckBoardStateTool, ValidateMoveTool};
pub use librarian::SearchCardsTool;

use crate::llm::ToolDefinition;
use crate::transcript::{ToolCall, ToolOutcome, ToolResult};
use async_trait::async_trait;
use futures::future;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Trait for tools the reasoning loop can call
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name
    fn name(&self) -> &str;

    /// Tool description for the model
    fn description(&self) -> String;

    /// JSON schema for tool input
    fn input_schema(&self) -> Value;

    /// Execute the tool. Bad arguments must come back as an error outcome,
    /// not a panic; the transcript records whatever happened.
    async fn run(&self, arguments: Value) -> ToolOutcome;
}

/// Collection of tools available to the agent
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    call_timeout: Duration,
}

impl ToolRegistry {
    pub fn new(call_timeout: Duration) -> Self {
        Self {
            tools: Vec::new(),
            call_timeout,
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.push(tool);
    }

    /// Get all tool definitions for the model
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// Execute a batch of tool calls concurrently.
    ///
    /// Returns once every call has settled. Results come back in the same
    /// order as `calls` regardless of which finished first, so transcript
    /// position always matches request position.
    pub async fn dispatch(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        future::join_all(calls.iter().map(|call| self.dispatch_one(call))).await
    }

    async fn dispatch_one(&self, call: &ToolCall) -> ToolResult {
        let outcome = match self.tools.iter().find(|t| t.name() == call.name) {
            Some(tool) => {
                tracing::debug!(tool = %call.name, call_id = %call.id, "running tool");
                let start = std::time::Instant::now();
                let outcome = match tokio::time::timeout(
                    self.call_timeout,
                    tool.run(call.arguments.clone()),
                )
                .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => ToolOutcome::error(format!(
                        "Tool '{}' timed out after {}s",
                        call.name,
                        self.call_timeout.as_secs()
                    )),
                };
                tracing::debug!(
                    tool = %call.name,
                    call_id = %call.id,
                    duration_ms = %start.elapsed().as_millis(),
                    "tool settled"
                );
                outcome
            }
            None => ToolOutcome::error(format!("Unknown tool: {}", call.name)),
        };

        if outcome.is_error() {
            tracing::warn!(tool = %call.name, call_id = %call.id, "tool call failed");
        }

        ToolResult {
            tool_call_id: call.id.clone(),
            outcome,
        }
    }
}
