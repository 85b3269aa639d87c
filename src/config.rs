//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and `SAFAR_*` environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::store::NewTopic;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub dataset: DatasetConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub feed: FeedConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Data store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Inserts buffered per live channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("safar").to_string_lossy().to_string())
        .unwrap_or_else(|| "./safar_data".to_string())
}

fn default_channel_capacity() -> usize {
    256
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_ws_connections")]
    pub max_ws_connections: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_ws_connections() -> usize {
    1000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
            request_timeout_secs: default_request_timeout(),
            max_ws_connections: default_max_ws_connections(),
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Chat configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Messages returned when a client opens the chat
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Days a message is kept; 0 keeps messages forever
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    #[serde(default = "default_retention_sweep")]
    pub retention_sweep_secs: u64,
}

fn default_history_limit() -> usize {
    100
}

fn default_retention_days() -> u32 {
    30
}

fn default_retention_sweep() -> u64 {
    3600
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            retention_days: default_retention_days(),
            retention_sweep_secs: default_retention_sweep(),
        }
    }
}

/// Deals dataset location; the built-in sample is used when unset
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasetConfig {
    pub deals_path: Option<PathBuf>,
    pub sharks_path: Option<PathBuf>,
}

/// Signed-in users
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub users: Vec<UserEntry>,
}

/// A `[[auth.users]]` entry: bearer token and the profile it signs in as
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserEntry {
    pub token: String,
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Feed configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Topics written when the topics table is empty
    #[serde(default = "default_topics")]
    pub topics: Vec<NewTopic>,
}

fn default_topics() -> Vec<NewTopic> {
    [
        ("Deal Breakdowns", "Term sheets, equity and royalty structures", "🦈", "deals"),
        ("Founder Stories", "Life after the pitch", "🚀", "founders"),
        ("Shark Strategies", "How each shark picks a winner", "🎯", "sharks"),
        ("Industry Watch", "Sectors heating up on the show", "📈", "industries"),
    ]
    .into_iter()
    .map(|(title, description, icon, category)| NewTopic {
        title: title.to_string(),
        description: Some(description.to_string()),
        icon: icon.to_string(),
        category: category.to_string(),
        is_active: true,
    })
    .collect()
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            topics: default_topics(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("safar").join("config.toml")),
            Some(PathBuf::from("/etc/safar/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply `SAFAR_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup
    ///
    /// Values that fail to parse are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Storage overrides
        if let Some(data_dir) = lookup("SAFAR_DATA_DIR") {
            self.storage.data_dir = data_dir;
        }

        // API overrides
        if let Some(host) = lookup("SAFAR_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("SAFAR_API_PORT").and_then(|p| p.parse().ok()) {
            self.api.port = port;
        }

        // Chat overrides
        if let Some(days) = lookup("SAFAR_CHAT_RETENTION_DAYS").and_then(|d| d.parse().ok()) {
            self.chat.retention_days = days;
        }

        // Dataset overrides
        if let Some(path) = lookup("SAFAR_DEALS_PATH") {
            self.dataset.deals_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("SAFAR_SHARKS_PATH") {
            self.dataset.sharks_path = Some(PathBuf::from(path));
        }

        // Logging overrides
        if let Some(level) = lookup("SAFAR_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("SAFAR_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Safar Configuration
#
# Environment variables override these settings:
# - SAFAR_DATA_DIR
# - SAFAR_API_HOST
# - SAFAR_API_PORT
# - SAFAR_CHAT_RETENTION_DAYS
# - SAFAR_DEALS_PATH
# - SAFAR_SHARKS_PATH
# - SAFAR_LOG_LEVEL
# - SAFAR_LOG_FORMAT

[storage]
# Directory holding safar.db
data_dir = "~/.local/share/safar"

# Inserts buffered per live channel before slow subscribers resync
channel_capacity = 256

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8082

# Allowed CORS origins
cors_origins = ["http://localhost:5173", "http://127.0.0.1:5173"]

# Request timeout in seconds
request_timeout_secs = 30

# Concurrent WebSocket connections
max_ws_connections = 1000

[chat]
# Messages loaded when the chat opens
history_limit = 100

# Delete messages older than this many days (0 keeps everything)
retention_days = 30

# How often the retention sweep runs (seconds)
retention_sweep_secs = 3600

[dataset]
# Deals and sharks CSV files; the built-in sample is used when unset
# deals_path = "/var/lib/safar/deals.csv"
# sharks_path = "/var/lib/safar/sharks.csv"

# Bearer tokens accepted by the API
# [[auth.users]]
# token = "change-me"
# id = "user-1"
# email = "founder@example.com"
# full_name = "Founder"

# Topics written on first start
# [[feed.topics]]
# title = "Deal Breakdowns"
# description = "Term sheets, equity and royalty structures"
# icon = "🦈"
# category = "deals"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/safar/safar.log"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.port, 8082);
        assert_eq!(config.chat.history_limit, 100);
        assert_eq!(config.chat.retention_days, 30);
        assert_eq!(config.storage.channel_capacity, 256);
        assert!(config.auth.users.is_empty());
        assert_eq!(config.feed.topics.len(), 4);
        assert!(config.dataset.deals_path.is_none());
    }

    #[test]
    fn test_default_template_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.api.request_timeout_secs, 30);
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.feed.topics.len(), 4);
    }

    #[test]
    fn test_parse_users_and_topics() {
        let config = Config::parse(
            r#"
            [chat]
            retention_days = 0

            [[auth.users]]
            token = "t1"
            id = "u1"
            email = "asha@example.com"
            full_name = "Asha"

            [[auth.users]]
            token = "t2"
            id = "u2"
            email = "ravi@example.com"

            [[feed.topics]]
            title = "Only"
            icon = "💡"
            category = "general"
            "#,
        )
        .unwrap();

        assert_eq!(config.chat.retention_days, 0);
        assert_eq!(config.chat.history_limit, 100);
        assert_eq!(config.auth.users.len(), 2);
        assert_eq!(config.auth.users[1].full_name, None);
        assert_eq!(config.feed.topics.len(), 1);
        assert!(config.feed.topics[0].is_active);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SAFAR_API_PORT", "9000"),
            ("SAFAR_CHAT_RETENTION_DAYS", "7"),
            ("SAFAR_DEALS_PATH", "/tmp/deals.csv"),
            ("SAFAR_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.api.port, 9000);
        assert_eq!(config.chat.retention_days, 7);
        assert_eq!(
            config.dataset.deals_path,
            Some(PathBuf::from("/tmp/deals.csv"))
        );
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.api.host, "0.0.0.0");
    }

    #[test]
    fn test_bad_override_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| (key == "SAFAR_API_PORT").then(|| "nope".to_string()));
        assert_eq!(config.api.port, 8082);
    }

    #[test]
    fn test_load_errors_name_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"[api]\nport = \"not a number\"\n").unwrap();

        match Config::load(&path) {
            Err(ConfigError::Parse { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected parse error, got {:?}", other),
        }
        assert!(matches!(
            Config::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
