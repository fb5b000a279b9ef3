//! Agent module - the core conversational agent logic.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Append the user message to the session's history
//! 2. Call the completion client with full history and available tools
//! 3. If the model requests tool calls, execute them in order and feed the
//!    results back
//! 4. Repeat until the model produces a final reply or the iteration bound
//!    is hit

mod agent_loop;
mod prompt;

pub use agent_loop::{Agent, AgentError, TurnError, CONTINUATION_PROMPT};
pub use prompt::build_system_prompt;
