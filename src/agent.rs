//! The reasoning loop
//!
//! Drives one user turn through an explicit state machine:
//! `Reasoning -> Routing -> (Dispatching -> Reasoning)* -> Finished`, with
//! terminal aborts for the cycle cap and cancellation. All conversation
//! history lives in the session's transcript; the loop appends to it and
//! never mutates past entries.

#[cfg(test)]
mod testing;

use crate::llm::{LlmError, LlmRequest, LlmService};
use crate::tools::ToolRegistry;
use crate::transcript::{Message, ToolCall, Transcript, TranscriptError};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// One conversation: a stable id plus the append-only transcript.
///
/// A turn borrows the session mutably for its whole duration, so two turns
/// can never interleave on the same history.
pub struct Session {
    id: Uuid,
    transcript: Transcript,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            transcript: Transcript::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// What to do with the newest assistant message.
#[derive(Debug, PartialEq)]
pub enum Route<'a> {
    Dispatch(&'a [ToolCall]),
    Finish,
}

/// Pure routing decision: a message carrying tool calls means dispatch,
/// anything else ends the turn.
pub fn route(message: &Message) -> Route<'_> {
    match message {
        Message::AssistantToolRequest { tool_calls, .. } if !tool_calls.is_empty() => {
            Route::Dispatch(tool_calls)
        }
        _ => Route::Finish,
    }
}

/// Why a turn stopped without producing an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    LoopExceeded { limit: u32 },
    Cancelled,
}

#[derive(Debug, Error)]
pub enum TurnError {
    #[error("reasoning step failed: {0}")]
    Reasoning(#[from] LlmError),
    #[error("tool loop exceeded {limit} cycles without a final answer")]
    LoopExceeded { limit: u32 },
    #[error("turn cancelled")]
    Cancelled,
    #[error(transparent)]
    Transcript(#[from] TranscriptError),
}

/// Progress notifications emitted while a turn runs. Subscribers get one
/// `ToolInvoked` per requested call and one `ToolSettled` once it resolves.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    ToolInvoked { name: String, arguments: Value },
    ToolSettled { name: String, ok: bool },
}

enum TurnState {
    Reasoning { cycle: u32 },
    Routing { cycle: u32 },
    Dispatching { cycle: u32, calls: Vec<ToolCall> },
    Finished { answer: String },
    Aborted { reason: AbortReason },
}

/// The loop controller. Holds shared handles only; per-turn state lives on
/// the stack of [`Agent::run_turn`].
pub struct Agent {
    llm: Arc<dyn LlmService>,
    tools: Arc<ToolRegistry>,
    system_prompt: String,
    max_tool_cycles: u32,
    events: broadcast::Sender<TurnEvent>,
}

impl Agent {
    pub fn new(
        llm: Arc<dyn LlmService>,
        tools: Arc<ToolRegistry>,
        system_prompt: impl Into<String>,
        max_tool_cycles: u32,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            llm,
            tools,
            system_prompt: system_prompt.into(),
            max_tool_cycles,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TurnEvent> {
        self.events.subscribe()
    }

    /// Runs one user turn to completion: appends the user message, then
    /// alternates reasoning and tool dispatch until the model answers in
    /// plain text, a guard fires, or `cancel` is triggered.
    ///
    /// Reasoning failures end the turn but not the session; the transcript
    /// keeps everything appended up to the failure.
    pub async fn run_turn(
        &self,
        session: &mut Session,
        input: impl Into<String>,
        cancel: &CancellationToken,
    ) -> Result<String, TurnError> {
        session.transcript.append(Message::user(input))?;
        tracing::info!(session = %session.id, "turn started");

        let mut state = TurnState::Reasoning { cycle: 0 };
        loop {
            state = match state {
                TurnState::Reasoning { cycle } => self.reason(session, cycle, cancel).await?,
                TurnState::Routing { cycle } => self.route_latest(session, cycle),
                TurnState::Dispatching { cycle, calls } => {
                    self.dispatch(session, cycle, calls, cancel).await?
                }
                TurnState::Finished { answer } => {
                    tracing::info!(session = %session.id, "turn finished");
                    return Ok(answer);
                }
                TurnState::Aborted { reason } => {
                    tracing::warn!(session = %session.id, ?reason, "turn aborted");
                    return Err(match reason {
                        AbortReason::LoopExceeded { limit } => TurnError::LoopExceeded { limit },
                        AbortReason::Cancelled => TurnError::Cancelled,
                    });
                }
            };
        }
    }

    async fn reason(
        &self,
        session: &mut Session,
        cycle: u32,
        cancel: &CancellationToken,
    ) -> Result<TurnState, TurnError> {
        let request = LlmRequest {
            system: self.system_prompt.clone(),
            messages: session.transcript.snapshot().to_vec(),
            tools: self.tools.definitions(),
        };

        let turn = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return Ok(TurnState::Aborted {
                    reason: AbortReason::Cancelled,
                });
            }
            result = self.llm.complete(&request) => result?,
        };

        session.transcript.append(turn.into_message())?;
        Ok(TurnState::Routing { cycle })
    }

    fn route_latest(&self, session: &Session, cycle: u32) -> TurnState {
        // Reasoning appends before routing, so the transcript is never empty
        // here.
        let Some(latest) = session.transcript.last() else {
            return TurnState::Finished {
                answer: String::new(),
            };
        };

        match route(latest) {
            Route::Dispatch(calls) => {
                if cycle >= self.max_tool_cycles {
                    TurnState::Aborted {
                        reason: AbortReason::LoopExceeded {
                            limit: self.max_tool_cycles,
                        },
                    }
                } else {
                    TurnState::Dispatching {
                        cycle: cycle + 1,
                        calls: calls.to_vec(),
                    }
                }
            }
            Route::Finish => TurnState::Finished {
                answer: match latest {
                    Message::AssistantText { content } => content.clone(),
                    _ => String::new(),
                },
            },
        }
    }

    async fn dispatch(
        &self,
        session: &mut Session,
        cycle: u32,
        calls: Vec<ToolCall>,
        cancel: &CancellationToken,
    ) -> Result<TurnState, TurnError> {
        for call in &calls {
            let _ = self.events.send(TurnEvent::ToolInvoked {
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            });
        }

        // Cancellation must not leave a half-appended batch, so the results
        // are only folded in after the whole batch settles.
        let results = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return Ok(TurnState::Aborted {
                    reason: AbortReason::Cancelled,
                });
            }
            results = self.tools.dispatch(&calls) => results,
        };

        for (call, result) in calls.iter().zip(results) {
            let _ = self.events.send(TurnEvent::ToolSettled {
                name: call.name.clone(),
                ok: !result.outcome.is_error(),
            });
            session.transcript.append(Message::tool_result(result))?;
        }

        Ok(TurnState::Reasoning { cycle })
    }
}
