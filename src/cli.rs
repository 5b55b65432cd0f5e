//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and environment fallbacks.

use crate::config::SourceKind;
use clap::Parser;
use std::path::PathBuf;

/// bi-agent - business intelligence chat over deal and work-order data
///
/// Serves `POST /chat`: founder questions are answered from the deal
/// funnel and work-order tracker (CSV exports or live boards) through
/// a hosted LLM.
///
/// Examples:
///   bi-agent
///   bi-agent --bind 0.0.0.0:8080 --deals-csv deals.csv --work-orders-csv orders.csv
///   bi-agent --source board --deals-board-id 123 --work-orders-board-id 456
///   bi-agent --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Address to listen on
    ///
    /// Default: from config or 127.0.0.1:5000.
    #[arg(long, value_name = "ADDR", env = "BI_AGENT_BIND")]
    pub bind: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .bi-agent.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Where to load tables from (csv, board)
    #[arg(long, value_name = "SOURCE")]
    pub source: Option<SourceKind>,

    /// Deal funnel CSV export
    #[arg(long, value_name = "FILE")]
    pub deals_csv: Option<PathBuf>,

    /// Work-order tracker CSV export
    #[arg(long, value_name = "FILE")]
    pub work_orders_csv: Option<PathBuf>,

    /// LLM model to use
    #[arg(short, long, env = "BI_AGENT_MODEL")]
    pub model: Option<String>,

    /// Base URL of the chat completions API
    #[arg(long, value_name = "URL", env = "OPENAI_BASE_URL")]
    pub llm_url: Option<String>,

    /// API key for the LLM provider
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// API key for the board API
    #[arg(long, env = "MONDAY_API_KEY", hide_env_values = true)]
    pub board_api_key: Option<String>,

    /// Board id of the deal funnel
    #[arg(long, value_name = "ID", env = "DEALS_BOARD_ID")]
    pub deals_board_id: Option<String>,

    /// Board id of the work-order tracker
    #[arg(long, value_name = "ID", env = "WORK_ORDERS_BOARD_ID")]
    pub work_orders_board_id: Option<String>,

    /// LLM request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .bi-agent.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.llm_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("LLM URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(ref bind) = self.bind {
            if bind.parse::<std::net::SocketAddr>().is_err() {
                return Err(format!("Invalid bind address: {}", bind));
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
