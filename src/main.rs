//! bi-agent - business intelligence chat service
//!
//! An HTTP service that answers founder questions about the deal funnel
//! and work-order tracker. Each request loads the tables (CSV exports or
//! live boards), normalizes and filters them, aggregates a summary and
//! asks a hosted LLM for insight.
//!
//! Exit codes:
//!   0 - Clean shutdown or --init-config success
//!   1 - Startup error (invalid arguments, config, bind failure)

mod analysis;
mod cli;
mod config;
mod data;
mod error;
mod llm;
mod models;
mod prompt;
mod server;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Values in .env become env fallbacks for the CLI
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("bi-agent v{}", env!("CARGO_PKG_VERSION"));
    if dotenv_loaded {
        debug!("Loaded environment from .env");
    }
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("Server failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .bi-agent.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   API keys are read from OPENAI_API_KEY and MONDAY_API_KEY.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Build the immutable configuration and serve.
async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    info!("Data source: {:?}", config.data.source);
    info!("Model: {} at {}", config.llm.model, config.llm.base_url);
    debug!("Credentials: {:?}", config.credentials);

    if config.credentials.llm_api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; /chat requests will fail");
    }

    server::run_server(config).await
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
