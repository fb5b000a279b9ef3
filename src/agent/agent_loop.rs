//! Core agent loop implementation.
//!
//! One user turn is an explicit state machine: AwaitingModel asks the
//! completion client for the next step, DispatchingTools executes requested
//! tool calls in issue order, and the turn ends in Done (final reply) or
//! Failed (typed reason). Every message the loop produces is appended to the
//! session store as it is produced, so an abandoned turn leaves a valid,
//! resumable history.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

use crate::llm::{CompletionClient, CompletionError, CompletionResult, Message, ToolCall, ToolSpec};
use crate::session::{SessionStore, StoreError};
use crate::tools::ToolRegistry;

/// Text of the synthetic user turn inserted after tool results for backends
/// that refuse a completion request otherwise. Never genuine user input.
pub const CONTINUATION_PROMPT: &str = "What should I do next?";

/// Terminal failure of a single turn. The session's history up to the
/// failure remains intact, so the caller may retry the whole turn.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("agent loop exceeded {limit} iterations without a final reply")]
    IterationLimitExceeded { limit: usize },

    #[error("completion protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("completion service failure: {0}")]
    UpstreamFailure(#[from] CompletionError),
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Turn(#[from] TurnError),
}

/// Where a turn currently stands.
enum TurnState {
    /// Waiting on the completion client for the next step.
    AwaitingModel,
    /// Executing the model's pending tool calls, in issue order.
    DispatchingTools(Vec<ToolCall>),
    /// Terminal: the model produced a natural-language reply.
    Done(String),
    /// Terminal: the turn failed with a typed reason.
    Failed(TurnError),
}

/// The conversational agent.
pub struct Agent {
    client: Arc<dyn CompletionClient>,
    tools: ToolRegistry,
    sessions: SessionStore,
    max_iterations: usize,
}

impl Agent {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        tools: ToolRegistry,
        sessions: SessionStore,
        max_iterations: usize,
    ) -> Self {
        Self {
            client,
            tools,
            sessions,
            max_iterations,
        }
    }

    /// The store this agent appends to.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Run one user turn to completion and return the final reply.
    pub async fn run_turn(&self, session_key: &str, user_text: &str) -> Result<String, AgentError> {
        self.sessions
            .append(session_key, Message::user(user_text))
            .await?;
        let mut history = self.sessions.history(session_key).await?;

        let specs = self.tools.specs();
        let mut state = TurnState::AwaitingModel;
        let mut iterations = 0usize;

        loop {
            state = match state {
                TurnState::AwaitingModel => {
                    iterations += 1;
                    if iterations > self.max_iterations {
                        TurnState::Failed(TurnError::IterationLimitExceeded {
                            limit: self.max_iterations,
                        })
                    } else {
                        tracing::debug!(
                            "Agent iteration {} (session: {})",
                            iterations,
                            session_key
                        );
                        self.await_model(session_key, &mut history, &specs).await?
                    }
                }
                TurnState::DispatchingTools(calls) => {
                    self.dispatch_tools(session_key, &mut history, calls).await?
                }
                TurnState::Done(reply) => return Ok(reply),
                TurnState::Failed(err) => return Err(err.into()),
            };
        }
    }

    /// Ask the completion client for the next step.
    async fn await_model(
        &self,
        session_key: &str,
        history: &mut Vec<Message>,
        specs: &[ToolSpec],
    ) -> Result<TurnState, AgentError> {
        // Strict backends refuse a request whose last turn is a tool result;
        // satisfy their ordering with a synthetic continuation turn.
        if self.client.requires_user_turn_after_tool_result()
            && matches!(history.last(), Some(Message::ToolResult { .. }))
        {
            let continuation = Message::User {
                text: CONTINUATION_PROMPT.to_string(),
                synthetic: true,
            };
            self.sessions.append(session_key, continuation.clone()).await?;
            history.push(continuation);
        }

        let result = match self.client.complete(history, specs).await {
            Ok(result) => result,
            Err(e) => return Ok(TurnState::Failed(TurnError::UpstreamFailure(e))),
        };

        match result {
            CompletionResult::FinalReply(text) => {
                let message = Message::assistant(text.clone());
                self.sessions.append(session_key, message.clone()).await?;
                history.push(message);
                Ok(TurnState::Done(text))
            }
            CompletionResult::ToolRequest(calls) => {
                if calls.is_empty() {
                    return Ok(TurnState::Failed(TurnError::ProtocolViolation(
                        "model requested zero tool calls".to_string(),
                    )));
                }
                let message = Message::Assistant {
                    text: None,
                    tool_calls: calls.clone(),
                };
                self.sessions.append(session_key, message.clone()).await?;
                history.push(message);
                Ok(TurnState::DispatchingTools(calls))
            }
        }
    }

    /// Execute the pending tool calls in the order they were issued,
    /// appending one correlated tool-result message per call.
    async fn dispatch_tools(
        &self,
        session_key: &str,
        history: &mut Vec<Message>,
        calls: Vec<ToolCall>,
    ) -> Result<TurnState, AgentError> {
        // A duplicate or empty call id would leave its result without an
        // unambiguous correlating request.
        let mut seen = HashSet::new();
        for call in &calls {
            if call.id.is_empty() || !seen.insert(call.id.clone()) {
                return Ok(TurnState::Failed(TurnError::ProtocolViolation(format!(
                    "duplicate or empty tool call id: '{}'",
                    call.id
                ))));
            }
        }

        for call in calls {
            let text = match self.tools.invoke(&call.name, &call.arguments).await {
                Ok(text) => text,
                // Registry-level failures go back to the model as data.
                Err(e) => format!("Error: {}", e),
            };

            let message = Message::ToolResult {
                call_id: call.id,
                tool_name: call.name,
                text,
            };
            self.sessions.append(session_key, message.clone()).await?;
            history.push(message);
        }

        Ok(TurnState::AwaitingModel)
    }
}
