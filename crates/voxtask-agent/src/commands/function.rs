use crate::cli::CallCommand;
use anyhow::{Context, Result};
use std::sync::Arc;
use voxtask_agent::assistant::ClassificationAssistant;
use voxtask_agent::bridge::Bridge;
use voxtask_agent::completion::OpenAiClient;
use voxtask_agent::config::Config;
use voxtask_agent::functions::FunctionRegistry;
use voxtask_agent::workflows::AgentServices;
use voxtask_core::repository::SqliteRepository;

pub fn print_declarations() -> Result<()> {
    let declarations = FunctionRegistry::new().declarations();
    println!("{}", serde_json::to_string_pretty(&declarations)?);
    Ok(())
}

fn build_bridge(repo: SqliteRepository, config: &Config) -> Result<Bridge> {
    let client = OpenAiClient::from_config(&config.completion, config.api_key()?)?;
    let services = AgentServices {
        repo: Arc::new(repo),
        assistant: ClassificationAssistant::new(Arc::new(client), &config.completion),
        timezone: config.timezone()?,
        skip_when_supplied: config.classification.skip_when_supplied,
    };
    Ok(Bridge::new(services))
}

pub async fn call_function(repo: SqliteRepository, config: &Config, command: CallCommand) -> Result<()> {
    let arguments: serde_json::Value =
        serde_json::from_str(&command.args).context("--args must be a JSON object")?;
    let mut bridge = build_bridge(repo, config)?;
    let output = bridge
        .invoke(&command.user, &command.function, arguments)
        .await?;
    println!("{}", output);
    Ok(())
}

pub async fn serve(repo: SqliteRepository, config: &Config) -> Result<()> {
    let mut bridge = build_bridge(repo, config)?;
    tracing::info!("serving voice function calls on stdin");
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    bridge.serve(stdin, tokio::io::stdout()).await?;
    Ok(())
}
