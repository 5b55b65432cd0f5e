//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.bi-agent.toml` files. Credentials never live in the file; they are
//! taken from the command line or the environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = ".bi-agent.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Data source settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Board API settings.
    #[serde(default)]
    pub board: BoardConfig,

    /// LLM settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// API keys, resolved from CLI/env only.
    #[serde(skip)]
    pub credentials: Credentials,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind the listener to.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

/// Where tables are loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Local CSV exports (default)
    #[default]
    Csv,
    /// Live board API
    Board,
}

/// Data source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Which source to load tables from.
    #[serde(default)]
    pub source: SourceKind,

    /// Deal funnel CSV export.
    #[serde(default = "default_deals_csv")]
    pub deals_csv: PathBuf,

    /// Work-order tracker CSV export.
    #[serde(default = "default_work_orders_csv")]
    pub work_orders_csv: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::default(),
            deals_csv: default_deals_csv(),
            work_orders_csv: default_work_orders_csv(),
        }
    }
}

fn default_deals_csv() -> PathBuf {
    PathBuf::from("Deal_funnel_Data.csv")
}

fn default_work_orders_csv() -> PathBuf {
    PathBuf::from("Work_Order_Tracker_Data.csv")
}

/// Board API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// GraphQL endpoint.
    #[serde(default = "default_board_api_url")]
    pub api_url: String,

    /// Board holding the deal funnel.
    #[serde(default)]
    pub deals_board_id: Option<String>,

    /// Board holding the work-order tracker.
    #[serde(default)]
    pub work_orders_board_id: Option<String>,

    /// Items requested per page.
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,

    /// Maximum pages followed per board.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            api_url: default_board_api_url(),
            deals_board_id: None,
            work_orders_board_id: None,
            page_limit: default_page_limit(),
            max_pages: default_max_pages(),
        }
    }
}

fn default_board_api_url() -> String {
    "https://api.monday.com/v2".to_string()
}

fn default_page_limit() -> usize {
    500
}

fn default_max_pages() -> usize {
    20
}

/// LLM settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the chat completions API.
    #[serde(default = "default_llm_url")]
    pub base_url: String,

    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Ask the LLM to extract sector/metric from questions.
    /// If false, only local keyword detection is used.
    #[serde(default = "default_true")]
    pub parse_queries: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_url(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout(),
            parse_queries: true,
        }
    }
}

fn default_llm_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_timeout() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

/// Analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Column holding row status; falls back to the first `*status*` column.
    #[serde(default)]
    pub status_column: Option<String>,

    /// Sector keywords recognised without the LLM.
    #[serde(default = "default_sectors")]
    pub sectors: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            status_column: None,
            sectors: default_sectors(),
        }
    }
}

fn default_sectors() -> Vec<String> {
    vec![
        "mining",
        "powerline",
        "renewables",
        "railways",
        "construction",
        "aviation",
        "manufacturing",
        "tender",
        "security and surveillance",
        "dsp",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// API keys for outbound calls.
#[derive(Clone, Default)]
pub struct Credentials {
    /// Key for the LLM provider.
    pub llm_api_key: Option<String>,
    /// Key for the board API.
    pub board_api_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("llm_api_key", &mask(&self.llm_api_key))
            .field("board_api_key", &mask(&self.board_api_key))
            .finish()
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments (and their environment fallbacks) take precedence over
    /// config file settings, but only when explicitly provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref bind) = args.bind {
            self.server.bind = bind.clone();
        }

        if let Some(source) = args.source {
            self.data.source = source;
        }
        if let Some(ref path) = args.deals_csv {
            self.data.deals_csv = path.clone();
        }
        if let Some(ref path) = args.work_orders_csv {
            self.data.work_orders_csv = path.clone();
        }

        if let Some(ref id) = args.deals_board_id {
            self.board.deals_board_id = Some(id.clone());
        }
        if let Some(ref id) = args.work_orders_board_id {
            self.board.work_orders_board_id = Some(id.clone());
        }

        if let Some(ref model) = args.model {
            self.llm.model = model.clone();
        }
        if let Some(ref url) = args.llm_url {
            self.llm.base_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.llm.timeout_seconds = timeout;
        }

        // Keys are never read from the file
        self.credentials = Credentials {
            llm_api_key: args.openai_api_key.clone().filter(|k| !k.is_empty()),
            board_api_key: args.board_api_key.clone().filter(|k| !k.is_empty()),
        };
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
