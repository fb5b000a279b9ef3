//! Completion-client boundary.
//!
//! The agent core talks to the external text-generation service through the
//! [`CompletionClient`] trait, so any compliant backend can be substituted
//! and tests can drive the loop with a scripted stub. A Gemini
//! implementation is provided in [`gemini`].

mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A single entry in a session's conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    /// A user turn. `synthetic` marks a continuation turn inserted by the
    /// agent loop for strict backends; transcripts filter those out.
    User {
        text: String,
        #[serde(default)]
        synthetic: bool,
    },
    /// An assistant turn. `text` is absent when the turn is a tool request.
    Assistant {
        text: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    /// The outcome of one tool call, correlated by `call_id`.
    ToolResult {
        call_id: String,
        tool_name: String,
        text: String,
    },
}

impl Message {
    /// A genuine user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Message::User {
            text: text.into(),
            synthetic: false,
        }
    }

    /// An assistant reply with no tool calls.
    pub fn assistant(text: impl Into<String>) -> Self {
        Message::Assistant {
            text: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, Message::User { synthetic: true, .. })
    }
}

/// An assistant-issued request to invoke one tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlates the eventual tool-result message.
    pub id: String,
    pub name: String,
    /// Raw argument bindings, not yet validated against the tool's schema.
    pub arguments: Value,
}

/// A tool as advertised to the completion service.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema for the tool's arguments.
    pub parameters: Value,
}

/// What the completion service produced for one request.
#[derive(Debug, Clone)]
pub enum CompletionResult {
    /// A natural-language reply; the turn is finished.
    FinalReply(String),
    /// The model wants these tools invoked before it can answer. May carry
    /// several calls; an empty list is a protocol defect the loop rejects.
    ToolRequest(Vec<ToolCall>),
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
}

/// Boundary to the external text-generation service.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Request a completion for the given history with the given tools
    /// available.
    async fn complete(
        &self,
        history: &[Message],
        tools: &[ToolSpec],
    ) -> Result<CompletionResult, CompletionError>;

    /// Whether the backend insists on a user-authored turn following any
    /// tool result before it will accept the next completion request. When
    /// true, the agent loop synthesizes a placeholder continuation turn.
    fn requires_user_turn_after_tool_result(&self) -> bool {
        false
    }
}
