//! Campaign Agent - Interactive Entry Point
//!
//! Runs the agent as an interactive prompt on stdin.

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campaign_agent::agent::{build_system_prompt, Agent};
use campaign_agent::config::Config;
use campaign_agent::llm::GeminiClient;
use campaign_agent::session::SessionStore;
use campaign_agent::tools::ToolRegistry;

const SESSION_KEY: &str = "default";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campaign_agent=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration: model={}", config.model);

    let tools = ToolRegistry::with_builtins()?;
    let system_prompt = build_system_prompt(&tools);
    let client = Arc::new(GeminiClient::new(
        &config.api_key,
        &config.model,
        &system_prompt,
    )?);
    let agent = Agent::new(client, tools, SessionStore::new(), config.max_iterations);

    println!("Agent is ready. Type your requests (e.g., \"What's the ROI on $5000 investment with $7000 returns?\").");
    println!("Type 'exit' to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();

        if input.eq_ignore_ascii_case("exit") {
            break;
        }
        if input.is_empty() {
            println!("Please enter a valid request.");
            continue;
        }

        match agent.run_turn(SESSION_KEY, input).await {
            Ok(reply) => println!("\nAgent: {}\n", reply),
            Err(e) => eprintln!("An error occurred: {}", e),
        }
    }

    Ok(())
}
