use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Data locations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataConfig {
    /// Base directory for persisted documents and logs.
    #[serde(default = "default_data_dir")]
    pub dir: String,
    #[serde(default = "default_accounts_file")]
    pub accounts_file: String,
    #[serde(default = "default_subscriptions_file")]
    pub subscriptions_file: String,
}

fn default_data_dir() -> String {
    "~/.autoposter".into()
}
fn default_accounts_file() -> String {
    "accounts.json".into()
}
fn default_subscriptions_file() -> String {
    "subscriptions.json".into()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            accounts_file: default_accounts_file(),
            subscriptions_file: default_subscriptions_file(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sender
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Wait used for a 429 response that carries no Retry-After header.
    #[serde(default = "default_rate_limit_fallback")]
    pub rate_limit_fallback_secs: u64,
}

fn default_api_base() -> String {
    "https://discord.com/api/v9".into()
}
fn default_max_retries() -> u32 {
    3
}
fn default_request_timeout() -> u64 {
    10
}
fn default_rate_limit_fallback() -> u64 {
    5
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            max_retries: default_max_retries(),
            request_timeout_secs: default_request_timeout(),
            rate_limit_fallback_secs: default_rate_limit_fallback(),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "text" or "json".
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Log directory; defaults to `<data dir>/logs`.
    pub dir: Option<String>,
}

fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            dir: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Root config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub sender: SenderConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Default path of the application config file.
pub fn config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".autoposter")
        .join("config.json")
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

pub fn data_dir_path(cfg: &Config) -> PathBuf {
    expand_tilde(&cfg.data.dir)
}

pub fn accounts_path(cfg: &Config) -> PathBuf {
    data_dir_path(cfg).join(&cfg.data.accounts_file)
}

pub fn subscriptions_path(cfg: &Config) -> PathBuf {
    data_dir_path(cfg).join(&cfg.data.subscriptions_file)
}

pub fn log_dir_path(cfg: &Config) -> PathBuf {
    match &cfg.log.dir {
        Some(dir) => expand_tilde(dir),
        None => data_dir_path(cfg).join("logs"),
    }
}

/// Load the config file, or defaults when it does not exist yet.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid config at {}", path.display()))
}

pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<()> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(cfg)?;
    std::fs::write(&path, json)
        .with_context(|| format!("failed to write config at {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let cfg = Config::default();
        assert_eq!(cfg.sender.max_retries, 3);
        assert_eq!(cfg.sender.api_base, "https://discord.com/api/v9");
        assert_eq!(cfg.log.level, "info");
        assert_eq!(cfg.data.accounts_file, "accounts.json");
    }

    #[test]
    fn empty_json_deserializes_to_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.sender.rate_limit_fallback_secs, 5);
        assert_eq!(cfg.data.subscriptions_file, "subscriptions.json");
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut cfg = Config::default();
        cfg.sender.max_retries = 5;
        save_config(&cfg, Some(&path)).unwrap();
        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.sender.max_retries, 5);
    }
}
