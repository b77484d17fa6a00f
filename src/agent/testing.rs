//! Test doubles for the reasoning loop.

use crate::llm::{AssistantTurn, LlmError, LlmRequest, LlmService};
use crate::tools::Tool;
use crate::transcript::ToolOutcome;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Scripted reasoning service: pops pre-baked turns in order, or repeats one
/// turn forever. Records every request it sees.
pub struct MockLlm {
    script: Mutex<VecDeque<Result<AssistantTurn, LlmError>>>,
    repeating: Option<AssistantTurn>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlm {
    pub fn scripted(turns: Vec<Result<AssistantTurn, LlmError>>) -> Self {
        Self {
            script: Mutex::new(turns.into()),
            repeating: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn repeating(turn: AssistantTurn) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            repeating: Some(turn),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmService for MockLlm {
    async fn complete(&self, request: &LlmRequest) -> Result<AssistantTurn, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(turn) = &self.repeating {
            return Ok(turn.clone());
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .expect("mock script exhausted")
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}

/// Programmable tool: fixed outcome, optional delay, and a start signal so a
/// test can act exactly while a call is in flight.
pub struct FakeTool {
    name: &'static str,
    outcome: ToolOutcome,
    delay: Option<Duration>,
    started: Arc<Notify>,
    invocations: Mutex<Vec<Value>>,
}

impl FakeTool {
    pub fn new(name: &'static str, outcome: ToolOutcome) -> Self {
        Self {
            name,
            outcome,
            delay: None,
            started: Arc::new(Notify::new()),
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn started(&self) -> Arc<Notify> {
        Arc::clone(&self.started)
    }

    pub fn invocations(&self) -> Vec<Value> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tool for FakeTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> String {
        "test double".to_string()
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({"type": "object"})
    }

    async fn run(&self, arguments: Value) -> ToolOutcome {
        self.invocations.lock().unwrap().push(arguments);
        self.started.notify_one();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }
}
