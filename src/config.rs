//! Configuration management for Querion.
//!
//! Settings come from an optional TOML file with environment variables
//! taking precedence, matching how deployments usually override the
//! completion API key and model without touching the file.

use crate::error::{QuerionError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default base URL for the completion API.
const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Fallback encryption key. Deployments must override via ENCRYPTION_KEY.
const DEFAULT_ENCRYPTION_KEY: &str = "default-secret-key-change-me";

/// API key values that count as "not configured".
const PLACEHOLDER_KEYS: [&str; 2] = ["sk-...", "your_openai_api_key"];

/// Completion request timeout in seconds.
pub const GENERATION_TIMEOUT_SECS: u64 = 20;

/// Resolved application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Completion API settings.
    pub llm: LlmConfig,

    /// Path to the SQLite connection store.
    pub store_path: PathBuf,

    /// Shared secret for the password codec.
    pub encryption_key: String,
}

/// Completion API settings.
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    /// API key, if configured at all.
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible completion endpoint.
    pub base_url: String,

    /// Operator override: use this single model instead of the fallback chain.
    pub model: Option<String>,
}

impl LlmConfig {
    /// Returns the API key if it is usable (present and not a placeholder).
    pub fn usable_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty() && !PLACEHOLDER_KEYS.contains(k))
    }
}

/// On-disk TOML shape. All fields optional; env vars win over the file.
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    llm: LlmFileSection,
    store_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LlmFileSection {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
}

impl Config {
    /// Loads configuration from the given file (or the default location when
    /// `None`), applying environment variable overrides.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let file = match config_path {
            Some(path) => Self::read_file(path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::read_file(&path)?,
                _ => ConfigFile::default(),
            },
        };

        let api_key = std::env::var("LLM_API_KEY").ok().or(file.llm.api_key);
        let base_url = std::env::var("LLM_BASE_URL")
            .ok()
            .or(file.llm.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("LLM_MODEL").ok().or(file.llm.model);

        let store_path = match std::env::var("QUERION_STORE_PATH") {
            Ok(p) => PathBuf::from(p),
            Err(_) => match file.store_path {
                Some(p) => p,
                None => Self::default_store_path()?,
            },
        };

        // Quotes sneak in when the key is copied into .env files verbatim.
        let encryption_key = std::env::var("ENCRYPTION_KEY")
            .unwrap_or_else(|_| DEFAULT_ENCRYPTION_KEY.to_string())
            .replace(['"', '\''], "")
            .trim()
            .to_string();

        Ok(Self {
            llm: LlmConfig {
                api_key,
                base_url,
                model,
            },
            store_path,
            encryption_key,
        })
    }

    fn read_file(path: &Path) -> Result<ConfigFile> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            QuerionError::config(format!("Could not read {}: {e}", path.display()))
        })?;
        toml::from_str(&contents)
            .map_err(|e| QuerionError::config(format!("Invalid config file: {e}")))
    }

    /// Returns the default config file path (`~/.config/querion/config.toml`).
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("querion").join("config.toml"))
    }

    /// Returns the default connection store path (`~/.config/querion/store.db`).
    pub fn default_store_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| QuerionError::config("Could not determine config directory"))?;
        Ok(config_dir.join("querion").join("store.db"))
    }
}
