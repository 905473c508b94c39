//! Configuration management
//!
//! This module handles loading and managing configuration from:
//! - Command-line arguments
//! - Environment variables
//! - Configuration files (TOML)
//! - Defaults

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Aptos mainnet REST endpoint
pub const DEFAULT_RPC_URL: &str = "https://api.mainnet.aptoslabs.com/v1";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub node: NodeConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Aptos node REST API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Base URL of the REST API (including the `/v1` prefix)
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Enable caching
    #[serde(default)]
    pub enabled: bool,

    /// Cache directory
    pub directory: Option<PathBuf>,

    /// Cache TTL in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions

fn default_rpc_url() -> String {
    DEFAULT_RPC_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_cache_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_log_level() -> String {
    "warn".to_string()
}

// Default implementations

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: None,
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file {:?}: {}", path, e)))?;

        Ok(config)
    }

    /// Load configuration from default locations
    ///
    /// Searches in order:
    /// 1. ./aptos-flow.toml
    /// 2. ~/.aptos-flow/config.toml
    /// 3. /etc/aptos-flow/config.toml
    pub fn load() -> Result<Self> {
        let mut paths = vec![PathBuf::from("aptos-flow.toml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".aptos-flow").join("config.toml"));
        }
        paths.push(PathBuf::from("/etc/aptos-flow/config.toml"));

        for path in paths {
            if path.exists() {
                return Self::from_file(path);
            }
        }

        Ok(Config::default())
    }

    /// Apply command-line overrides on top of the file configuration
    pub fn with_overrides(mut self, rpc_url: Option<String>, cache: bool) -> Self {
        if let Some(url) = rpc_url {
            self.node.rpc_url = url;
        }
        if cache {
            self.cache.enabled = true;
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.node.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    /// Get cache directory with fallback to default
    ///
    /// A leading `~` is expanded to the home directory.
    pub fn cache_directory(&self) -> PathBuf {
        match &self.cache.directory {
            Some(dir) => expand_home(dir),
            None => dirs::cache_dir()
                .map(|c| c.join("aptos-flow"))
                .unwrap_or_else(|| PathBuf::from("/tmp/aptos-flow-cache")),
        }
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.node.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.node.timeout_secs, 30);
        assert!(!config.cache.enabled);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_parse_toml_config() {
        let toml = r#"
[node]
rpc_url = "https://api.testnet.aptoslabs.com/v1"

[cache]
enabled = true
directory = "/tmp/flow-cache"

[logging]
level = "debug"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.node.rpc_url, "https://api.testnet.aptoslabs.com/v1");
        assert_eq!(config.node.timeout_secs, 30);
        assert!(config.cache.enabled);
        assert_eq!(config.cache_directory(), PathBuf::from("/tmp/flow-cache"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_overrides() {
        let config = Config::default().with_overrides(Some("http://localhost:8080/v1".into()), true);
        assert_eq!(config.node.rpc_url, "http://localhost:8080/v1");
        assert!(config.cache.enabled);

        let config = Config::default().with_overrides(None, false);
        assert_eq!(config.node.rpc_url, DEFAULT_RPC_URL);
        assert!(!config.cache.enabled);
    }

    #[test]
    fn test_cache_directory_expands_home() {
        let config: Config = toml::from_str(
            r#"
[cache]
directory = "~/.cache/aptos-flow"
"#,
        )
        .unwrap();

        let home = dirs::home_dir().unwrap();
        assert_eq!(config.cache_directory(), home.join(".cache/aptos-flow"));
    }

    #[test]
    fn test_from_file_missing() {
        let err = Config::from_file("/nonexistent/aptos-flow.toml").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
