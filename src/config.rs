//! Configuration parsing and validation.
//!
//! Civic Assist is configured with a TOML file (default
//! `./config/civic.toml`). Only `[db].path` is required; every other
//! section has defaults. The completion API key is never read from the
//! file; it comes from the `OPENAI_API_KEY` environment variable.
//!
//! ```toml
//! [db]
//! path = "./data/civic.sqlite"
//! max_connections = 5
//! busy_timeout_secs = 5
//!
//! [retrieval]
//! limit = 5
//! excerpt_chars = 500
//! recommendation_limit = 3
//!
//! [completion]
//! provider = "openai"
//! model = "gpt-4o-mini"
//! max_tokens = 1000
//! temperature = 0.7
//! timeout_secs = 30
//!
//! [analytics]
//! enabled = true
//! queue_capacity = 256
//!
//! [server]
//! bind = "127.0.0.1:8787"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use civic_assist_core::completion::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
    /// Pool size shared by assistant turns, the analytics worker and view counting.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// How long a writer waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
}

impl DbConfig {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_connections: default_max_connections(),
            busy_timeout_secs: default_busy_timeout_secs(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout_secs() -> u64 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Maximum candidates per turn.
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Per-article body budget in the system prompt, in characters.
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
    #[serde(default = "default_recommendation_limit")]
    pub recommendation_limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            excerpt_chars: default_excerpt_chars(),
            recommendation_limit: default_recommendation_limit(),
        }
    }
}

fn default_limit() -> usize {
    civic_assist_core::retrieve::DEFAULT_LIMIT
}
fn default_excerpt_chars() -> usize {
    civic_assist_core::prompt::DEFAULT_EXCERPT_CHARS
}
fn default_recommendation_limit() -> usize {
    civic_assist_core::recommend::DEFAULT_LIMIT
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    /// `"disabled"` or `"openai"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra attempts on 429/5xx. Zero means a single attempt.
    #[serde(default)]
    pub max_retries: u32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: default_base_url(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
        }
    }
}

impl CompletionConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}
fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Records buffered before new ones are dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_queue_capacity() -> usize {
    256
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
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
    "127.0.0.1:8787".to_string()
}

impl Config {
    /// A config with defaults everywhere and the given database path.
    pub fn with_db_path(path: impl Into<PathBuf>) -> Self {
        Self {
            db: DbConfig::at(path),
            retrieval: RetrievalConfig::default(),
            completion: CompletionConfig::default(),
            analytics: AnalyticsConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.db.max_connections < 1 {
        anyhow::bail!("db.max_connections must be >= 1");
    }
    if config.retrieval.limit < 1 {
        anyhow::bail!("retrieval.limit must be >= 1");
    }
    if config.retrieval.excerpt_chars < 1 {
        anyhow::bail!("retrieval.excerpt_chars must be >= 1");
    }

    match config.completion.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown completion provider: '{}'. Must be disabled or openai.",
            other
        ),
    }
    if config.completion.is_enabled() && config.completion.model.trim().is_empty() {
        anyhow::bail!(
            "completion.model must be specified when provider is '{}'",
            config.completion.provider
        );
    }
    if config.completion.max_tokens < 1 {
        anyhow::bail!("completion.max_tokens must be >= 1");
    }
    if !(0.0..=2.0).contains(&config.completion.temperature) {
        anyhow::bail!("completion.temperature must be in [0.0, 2.0]");
    }
    if config.completion.timeout_secs < 1 {
        anyhow::bail!("completion.timeout_secs must be >= 1");
    }

    if config.analytics.queue_capacity < 1 {
        anyhow::bail!("analytics.queue_capacity must be >= 1");
    }

    Ok(())
}
