//! Configuration for the zAI coordinator
//!
//! Loads and saves `~/.zai/config.json`. Secrets may be left empty in the
//! file and supplied through the environment instead.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod paths;

pub use paths::{agents_dir, config_path, data_dir, expand_home};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config not found: {0}")]
    NotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Credentials for one LLM endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

/// Known LLM endpoints
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai: ProviderConfig,
    #[serde(default)]
    pub openrouter: ProviderConfig,
}

/// Coordinator model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_max_iterations")]
    pub max_tool_iterations: u32,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_workflow_name")]
    pub workflow_name: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_tool_iterations: default_max_iterations(),
            history_limit: default_history_limit(),
            workflow_name: default_workflow_name(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_max_iterations() -> u32 {
    10
}

fn default_history_limit() -> usize {
    50
}

fn default_workflow_name() -> String {
    "zAI Master Agent Workflow".to_string()
}

/// SerpAPI search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,
}

fn default_max_results() -> u32 {
    5
}

fn default_search_endpoint() -> String {
    "https://serpapi.com/search".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            max_results: default_max_results(),
            endpoint: default_search_endpoint(),
        }
    }
}

/// Bot database HTTP API settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
}

/// Tool settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolkitConfig {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// How a delegate agent is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportSetting {
    InProcess,
    Subprocess,
}

/// One delegate agent declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    pub transport: TransportSetting,
    /// Module key (in-process) or launcher script path (subprocess)
    pub location: String,
    /// Function name (in-process) or argv template (subprocess)
    #[serde(default)]
    pub entry_point: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub categories: Vec<String>,
    /// Overrides `DelegatesConfig::timeout_secs`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Delegate agents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegatesConfig {
    #[serde(default = "default_delegate_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_agents")]
    pub agents: Vec<AgentConfig>,
}

fn default_delegate_timeout() -> u64 {
    180
}

fn default_agents() -> Vec<AgentConfig> {
    vec![AgentConfig {
        name: "model_agent".to_string(),
        transport: TransportSetting::InProcess,
        location: "zai.model".to_string(),
        entry_point: "query".to_string(),
        description: "General-purpose agent answering directly with the language model"
            .to_string(),
        categories: vec!["general".to_string(), "direct_model".to_string()],
        timeout_secs: None,
    }]
}

impl Default for DelegatesConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_delegate_timeout(),
            agents: default_agents(),
        }
    }
}

impl DelegatesConfig {
    /// Effective timeout for one agent in seconds
    pub fn timeout_for(&self, agent: &AgentConfig) -> u64 {
        agent.timeout_secs.unwrap_or(self.timeout_secs)
    }
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    #[serde(default)]
    pub toolkit: ToolkitConfig,
    #[serde(default)]
    pub delegates: DelegatesConfig,
}

impl Config {
    /// Load from the default location
    pub async fn load() -> Result<Self> {
        let path = config_path();
        Self::load_from(&path).await
    }

    /// Load from a specific location, defaults when the file is missing
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        debug!("Loading config from {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load from a path that must exist
    pub async fn load_existing(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        Self::load_from(path).await
    }

    /// Save to the default location
    pub async fn save(&self) -> Result<()> {
        let path = config_path();
        self.save_to(&path).await
    }

    /// Save to a specific location
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        debug!("Writing config to {:?}", path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// LLM API key: openrouter, then openai, then `OPENAI_API_KEY`
    pub fn api_key(&self) -> Option<String> {
        let key = self.providers.openrouter.api_key.clone();
        if !key.is_empty() {
            return Some(key);
        }

        let key = self.providers.openai.api_key.clone();
        if !key.is_empty() {
            return Some(key);
        }

        non_empty_env("OPENAI_API_KEY")
    }

    /// LLM API base URL matching the selected key
    pub fn api_base(&self) -> Option<String> {
        if !self.providers.openrouter.api_key.is_empty() {
            return self
                .providers
                .openrouter
                .api_base
                .clone()
                .or_else(|| Some("https://openrouter.ai/api/v1".to_string()));
        }

        self.providers
            .openai
            .api_base
            .clone()
            .filter(|base| !base.is_empty())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    pub fn default_model(&self) -> String {
        self.coordinator.model.clone()
    }

    /// SerpAPI key from config or `SERPAPI_KEY`
    pub fn search_api_key(&self) -> Option<String> {
        let key = &self.toolkit.search.api_key;
        if key.is_empty() {
            non_empty_env("SERPAPI_KEY")
        } else {
            Some(key.clone())
        }
    }

    /// Bot database key from config or `BOT_DB_API_KEY`
    pub fn database_api_key(&self) -> Option<String> {
        let key = &self.toolkit.database.api_key;
        if key.is_empty() {
            non_empty_env("BOT_DB_API_KEY")
        } else {
            Some(key.clone())
        }
    }

    /// Search result count, clamped to 1..=10
    pub fn search_max_results(&self) -> u32 {
        self.toolkit.search.max_results.clamp(1, 10)
    }

    pub fn history_limit(&self) -> usize {
        self.coordinator.history_limit
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Create the data directory and a default config if none exists
pub async fn init() -> Result<Config> {
    let config_path = config_path();

    if config_path.exists() {
        warn!("Config already exists at {:?}", config_path);
    } else {
        let config = Config::default();
        config.save().await?;
        info!("Wrote default config to {:?}", config_path);
    }

    let agents = agents_dir();
    tokio::fs::create_dir_all(&agents).await?;
    info!("Agent script directory ready at {:?}", agents);

    Config::load().await
}
