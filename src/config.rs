//! Server settings.
//!
//! Settings come from an optional JSON file in the user's config directory
//! (`<config dir>/feature-sieve/config.json`) and are then overridden by
//! environment variables:
//! - `SIEVE_DUPLICATE_THRESHOLD`, `SIEVE_RELATED_THRESHOLD`, `SIEVE_QUERY_LIMIT`
//! - `SIEVE_PORT`, `SIEVE_CORS_ORIGINS` (comma-separated)
//! - `OPENAI_API_KEY`, `OPENAI_BASE_URL`, `SIEVE_CHAT_MODEL`, `SIEVE_EMBEDDING_MODEL`
//!
//! Without an API key the server runs with offline collaborators.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use sieve_core::DedupConfig;

const APP_NAME: &str = "feature-sieve";
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Port for the HTTP API.
    pub port: u16,
    /// Allowed CORS origins. Any origin is allowed when unset.
    pub cors_origins: Option<Vec<String>>,
    pub dedup: DedupConfig,
    pub openai: OpenAiSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            cors_origins: None,
            dedup: DedupConfig::default(),
            openai: OpenAiSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    /// Length of the vectors returned by `embedding_model`.
    pub embedding_dimension: usize,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_dimension: DEFAULT_EMBEDDING_DIM,
        }
    }
}

impl Settings {
    /// Load the config file (defaults if it is missing or broken), then apply
    /// environment overrides.
    pub fn load() -> Self {
        let settings = match get_config_path().and_then(|path| Self::from_file(&path)) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        };
        settings.with_overrides(|name| std::env::var(name).ok())
    }

    /// Read settings from a JSON file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let settings = serde_json::from_str(&content).context("Failed to parse config file")?;

        Ok(settings)
    }

    /// Apply overrides from a variable lookup, normally the process environment.
    /// Values that fail to parse are logged and ignored.
    pub fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = parsed(&var, "SIEVE_DUPLICATE_THRESHOLD") {
            self.dedup.duplicate_threshold = value;
        }
        if let Some(value) = parsed(&var, "SIEVE_RELATED_THRESHOLD") {
            self.dedup.related_threshold = value;
        }
        if let Some(value) = parsed(&var, "SIEVE_QUERY_LIMIT") {
            self.dedup.query_limit = value;
        }
        if let Some(value) = parsed(&var, "SIEVE_PORT") {
            self.port = value;
        }
        if let Some(origins) = var("SIEVE_CORS_ORIGINS") {
            self.cors_origins = Some(
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            );
        }

        if let Some(key) = var("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.openai.api_key = Some(key);
        }
        if let Some(url) = var("OPENAI_BASE_URL") {
            self.openai.base_url = url;
        }
        if let Some(model) = var("SIEVE_CHAT_MODEL") {
            self.openai.chat_model = model;
        }
        if let Some(model) = var("SIEVE_EMBEDDING_MODEL") {
            self.openai.embedding_model = model;
        }

        self
    }

    pub fn is_offline(&self) -> bool {
        self.openai.api_key.is_none()
    }
}

fn parsed<T: FromStr>(var: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = var(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring {}: cannot parse {:?}", name, raw);
            None
        }
    }
}

fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}
