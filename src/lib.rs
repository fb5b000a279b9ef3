//! # Campaign Agent
//!
//! A memory-backed marketing assistant core built around a bounded,
//! tool-calling agent loop.
//!
//! This library provides:
//! - Per-session conversational memory with an in-memory store
//! - A registry of schema-typed marketing tools (ROI, budget allocation,
//!   competitor lookup)
//! - A completion-client boundary so any text-generation backend can be
//!   substituted, with a Gemini implementation included
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Append the user message to the session's history
//! 2. Call the completion client with full history and available tools
//! 3. If the model requests tool calls, execute them in order and feed the
//!    results back
//! 4. Repeat until the model produces a final reply or the iteration bound
//!    is hit
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use campaign_agent::agent::{build_system_prompt, Agent};
//! use campaign_agent::config::Config;
//! use campaign_agent::llm::GeminiClient;
//! use campaign_agent::session::SessionStore;
//! use campaign_agent::tools::ToolRegistry;
//!
//! let config = Config::from_env()?;
//! let tools = ToolRegistry::with_builtins()?;
//! let prompt = build_system_prompt(&tools);
//! let client = Arc::new(GeminiClient::new(&config.api_key, &config.model, &prompt)?);
//! let agent = Agent::new(client, tools, SessionStore::new(), config.max_iterations);
//! let reply = agent.run_turn("default", "What's the ROI on $5000 with $7000 returns?").await?;
//! ```

pub mod agent;
pub mod config;
pub mod llm;
pub mod session;
pub mod tools;

pub use config::Config;
