//! Configuration management
//!
//! This module handles loading, validation, and management of the NutriPlan
//! configuration. Configuration is stored in TOML format at ~/.nutri/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level
//! - **llm**: Generation provider selection, per-provider settings, call timeout
//! - **search**: Web search settings for nutrition-fact lookups
//! - **router**: Timeout applied to each non-terminal responder
//!
//! API keys never live in this file. Each provider section names the
//! environment variable that holds its key.
//!
//! # Examples
//!
//! ```no_run
//! use nutri_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//!
//! println!("Default provider: {}", config.llm.default_provider);
//! println!("Search enabled: {}", config.search.enabled);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Generation provider configuration
    pub llm: LLMConfig,

    /// Web search configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Turn router configuration
    #[serde(default)]
    pub router: RouterConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Generation provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Provider used for every generation call (gemini, ollama)
    pub default_provider: String,

    /// Upper bound for a single generation call, in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Gemini provider settings
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Ollama provider settings
    #[serde(default)]
    pub ollama: OllamaConfig,
}

/// Gemini provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Base URL for Gemini API
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_gemini_key_env")]
    pub api_key_env: String,
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL for Ollama API
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

/// Web search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Register the nutrition-fact search responder
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Base URL for the Custom Search JSON API
    #[serde(default = "default_search_base_url")]
    pub base_url: String,

    /// Environment variable holding the API key
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,

    /// Environment variable holding the search engine id
    #[serde(default = "default_search_engine_env")]
    pub engine_id_env: String,

    /// Number of snippets requested per query (1-10)
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Upper bound for a single search call, in seconds
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

/// Turn router configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Upper bound for a non-terminal responder; expiry counts as a skip
    #[serde(default = "default_responder_timeout")]
    pub responder_timeout_secs: u64,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_gemini_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_search_base_url() -> String {
    "https://www.googleapis.com/customsearch/v1".to_string()
}

fn default_search_key_env() -> String {
    "GOOGLE_SEARCH_API_KEY".to_string()
}

fn default_search_engine_env() -> String {
    "GOOGLE_SEARCH_ENGINE_ID".to_string()
}

fn default_max_results() -> usize {
    5
}

fn default_search_timeout() -> u64 {
    20
}

fn default_responder_timeout() -> u64 {
    90
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: default_gemini_base_url(),
            model: default_gemini_model(),
            api_key_env: default_gemini_key_env(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            default_provider: "gemini".to_string(),
            timeout_secs: default_llm_timeout(),
            gemini: GeminiConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_search_base_url(),
            api_key_env: default_search_key_env(),
            engine_id_env: default_search_engine_env(),
            max_results: default_max_results(),
            timeout_secs: default_search_timeout(),
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            responder_timeout_secs: default_responder_timeout(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    /// Load configuration from the default location (~/.nutri/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;
        Self::load_or_create_at(&config_path)
    }

    /// Load configuration from `path`, writing the defaults there first if
    /// the file doesn't exist
    pub fn load_or_create_at(path: &Path) -> Result<Self, EngineError> {
        if path.exists() {
            Self::load_from_path(path)
        } else {
            Self::create_default(path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let config = Self::default_config();
        config.validate()?;

        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.nutri/config.toml)
    pub fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".nutri").join("config.toml"))
    }

    /// Create a default configuration
    fn default_config() -> Self {
        Self {
            core: CoreConfig::default(),
            llm: LLMConfig::default(),
            search: SearchConfig::default(),
            router: RouterConfig::default(),
        }
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The log level or provider name is unknown
    /// - A timeout is zero
    /// - `search.max_results` is outside 1-10
    /// - With search enabled, `router.responder_timeout_secs` does not exceed
    ///   the search timeout plus the LLM timeout
    pub fn validate(&self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        let valid_providers = ["gemini", "ollama"];
        if !valid_providers.contains(&self.llm.default_provider.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid default provider '{}'. Must be one of: {}",
                self.llm.default_provider,
                valid_providers.join(", ")
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(EngineError::Config(
                "llm.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.search.timeout_secs == 0 {
            return Err(EngineError::Config(
                "search.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.router.responder_timeout_secs == 0 {
            return Err(EngineError::Config(
                "router.responder_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if !(1..=10).contains(&self.search.max_results) {
            return Err(EngineError::Config(
                "search.max_results must be between 1 and 10".to_string(),
            ));
        }

        // The search responder runs a search and then a summary inside one
        // router slot
        let search_budget = self.search.timeout_secs + self.llm.timeout_secs;
        if self.search.enabled && self.router.responder_timeout_secs <= search_budget {
            return Err(EngineError::Config(format!(
                "router.responder_timeout_secs ({}) must exceed search.timeout_secs + llm.timeout_secs ({})",
                self.router.responder_timeout_secs, search_budget
            )));
        }

        Ok(())
    }
}
