/*
pagemark - single-binary main.rs
This binary starts the Rocket HTTP server that turns web pages into Markdown.
*/

use anyhow::{Context, Result};
use clap::Parser;
use common::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use pagemark::llm;
use pagemark::server::launch_rocket;

#[derive(Parser, Debug)]
#[command(name = "pagemark", about = "pagemark URL-to-Markdown server")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI args
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // Resolve config paths
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = args.config {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() {
            Some(p)
        } else {
            None
        }
    };

    // Load configuration with defaults
    let config = Config::load_with_defaults(
        if default_path.exists() {
            Some(&default_path)
        } else {
            None
        },
        override_path.as_deref(),
    )
    .await
    .context("failed to load configuration")?;
    info!(default = ?default_path, override = ?override_path, "configuration loaded");

    // Initialize the LLM provider used by the rewrite route. A configured
    // adapter with a missing key logs an error and leaves the provider unset;
    // the scrape-only routes keep working.
    let llm_provider: Option<Arc<dyn llm::LlmProvider>> = match config.llm.as_ref() {
        Some(llm_config) => match create_llm_provider(llm_config) {
            Ok(Some(provider)) => {
                info!(
                    "LLM provider initialized: {}",
                    llm_config
                        .remote
                        .as_ref()
                        .and_then(|r| r.model.as_deref())
                        .unwrap_or("unknown")
                );
                Some(Arc::from(provider))
            }
            Ok(None) => None,
            Err(e) => {
                error!("Failed to initialize LLM provider: {:#}", e);
                None
            }
        },
        None => None,
    };

    // Launch the Rocket server (blocking until Rocket shuts down)
    info!("Launching Rocket HTTP server");
    launch_rocket(Some(Arc::new(config)), llm_provider).await
}

/// Create an LLM provider based on configuration
fn create_llm_provider(
    llm_config: &common::LlmConfig,
) -> Result<Option<Box<dyn llm::LlmProvider>>> {
    let adapter = llm_config.adapter.as_deref().unwrap_or("none");
    match adapter {
        "remote" => {
            let remote_config = llm_config
                .remote
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("remote adapter selected but [llm.remote] is missing"))?;

            // Fetch API key from env var
            let api_key_env = remote_config
                .api_key_env
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("Missing api_key_env in [llm.remote]"))?;

            let api_key = std::env::var(api_key_env)
                .with_context(|| format!("LLM API key env var '{}' not set", api_key_env))?;

            let model = remote_config
                .model
                .clone()
                .unwrap_or_else(|| "gemma2-9b-it".to_string());
            let api_url = remote_config.api_url.clone().unwrap_or_else(|| {
                "https://api.groq.com/openai/v1/chat/completions".to_string()
            });

            let provider = llm::remote::RemoteLlmProvider::new(api_url, api_key, model)
                .with_defaults(
                    remote_config.timeout_seconds.unwrap_or(60),
                    remote_config.max_tokens.unwrap_or(2048),
                    0.7,
                );
            Ok(Some(Box::new(provider)))
        }
        "none" => Ok(None),
        _ => anyhow::bail!("Unknown LLM adapter type: {}", adapter),
    }
}
