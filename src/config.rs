//! Configuration loading and schema.
//!
//! A TOML file with full defaults: every field is optional and the
//! binary runs with no config file at all.  The upstream API key can
//! also arrive via `ROSARIUM_API_KEY`; its absence is a normal
//! condition that degrades synthesis to the silent-paced fallback.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::tts::upstream::UpstreamConfig;
use crate::tts::TtsClientConfig;

/// Environment variable consulted for the upstream API key.
pub const API_KEY_ENV: &str = "ROSARIUM_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSection,
    pub upstream: UpstreamSection,
    pub client: ClientSection,
    pub storage: StorageSection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerSection::default(),
            upstream: UpstreamSection::default(),
            client: ClientSection::default(),
            storage: StorageSection::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind_addr: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8787".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamSection {
    pub endpoint: String,
    pub model: String,
    /// Whole-session budget, e.g. "25s" or "1m".
    pub session_budget: String,
    /// Usually supplied via [`API_KEY_ENV`] instead of the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for UpstreamSection {
    fn default() -> Self {
        let defaults = UpstreamConfig::default();
        Self {
            endpoint: defaults.endpoint,
            model: defaults.model,
            session_budget: "25s".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSection {
    pub proxy_url: String,
    pub max_attempts: u32,
    pub backoff_step_ms: u64,
    /// Per-request timeout, e.g. "30s".
    pub request_timeout: String,
    pub fallback_words_per_sec: f64,
}

impl Default for ClientSection {
    fn default() -> Self {
        let defaults = TtsClientConfig::default();
        Self {
            proxy_url: defaults.proxy_url,
            max_attempts: defaults.max_attempts,
            backoff_step_ms: defaults.backoff_step_ms,
            request_timeout: "30s".to_string(),
            fallback_words_per_sec: defaults.fallback_words_per_sec,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Overrides the platform data directory.
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Load from `path`, or defaults when `path` is `None` or missing.
    /// The API key environment variable wins over the file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                toml::from_str(&text)
                    .with_context(|| format!("failed to parse {}", path.display()))?
            }
            _ => Config::default(),
        };
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                config.upstream.api_key = Some(key);
            }
        }
        Ok(config)
    }

    /// Resolve the data directory (override, platform default, or cwd).
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.storage.data_dir {
            return dir.clone();
        }
        directories::ProjectDirs::from("app", "rosarium", "rosarium")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn cache_db_path(&self) -> PathBuf {
        self.data_dir().join("audio_cache.db")
    }

    pub fn prefs_db_path(&self) -> PathBuf {
        self.data_dir().join("prefs.db")
    }

    pub fn prefs_json_path(&self) -> PathBuf {
        self.data_dir().join("prefs.json")
    }

    pub fn upstream_config(&self) -> Result<UpstreamConfig> {
        let budget = parse_duration(&self.upstream.session_budget)
            .map_err(|e| anyhow::anyhow!("upstream.session_budget: {}", e))?;
        Ok(UpstreamConfig {
            endpoint: self.upstream.endpoint.clone(),
            model: self.upstream.model.clone(),
            api_key: self.upstream.api_key.clone(),
            session_budget_secs: budget.as_secs(),
        })
    }

    pub fn client_config(&self) -> Result<TtsClientConfig> {
        let timeout = parse_duration(&self.client.request_timeout)
            .map_err(|e| anyhow::anyhow!("client.request_timeout: {}", e))?;
        Ok(TtsClientConfig {
            proxy_url: self.client.proxy_url.clone(),
            max_attempts: self.client.max_attempts,
            backoff_step_ms: self.client.backoff_step_ms,
            request_timeout_secs: timeout.as_secs(),
            fallback_words_per_sec: self.client.fallback_words_per_sec,
            ..Default::default()
        })
    }
}

/// Parse a duration string like "30s", "5m", "1h30m".
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let mut total_seconds: u64 = 0;
    let mut current_num = String::new();

    for c in s.chars() {
        if c.is_ascii_digit() {
            current_num.push(c);
        } else {
            let num: u64 = current_num
                .parse()
                .map_err(|_| format!("invalid number in duration: {}", s))?;
            current_num.clear();

            total_seconds += match c {
                's' => num,
                'm' => num * 60,
                'h' => num * 3600,
                _ => return Err(format!("unknown duration unit: {}", c)),
            };
        }
    }

    if total_seconds == 0 {
        return Err(format!("invalid duration: {}", s));
    }

    Ok(Duration::from_secs(total_seconds))
}
