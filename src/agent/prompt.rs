//! System prompt template for the agent.

use crate::tools::ToolRegistry;

/// Build the system prompt with the tool roster interpolated.
pub fn build_system_prompt(tools: &ToolRegistry) -> String {
    let tool_names = tools
        .specs()
        .iter()
        .map(|t| t.name.clone())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are an expert AI agent specializing in digital marketing and financial calculations. \
         Your task is to assist users with ROI calculations, budget allocation, and competitor \
         analysis. You have access to the following tools: {}",
        tool_names
    )
}
