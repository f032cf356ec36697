use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Root configuration for widgetbot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[derive(Default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub cors: CorsConfig,
}

impl Config {
    /// Get expanded data directory path.
    pub fn data_dir_path(&self) -> PathBuf {
        let path = &self.storage.data_dir;
        if path.starts_with("~/") || path.starts_with("~\\") {
            if let Some(home) = dirs::home_dir() {
                return home.join(&path[2..]);
            }
        }
        PathBuf::from(path)
    }

    /// Address the HTTP server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_body_bytes: 256 * 1024,
        }
    }
}

/// Where instance records are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(format!("Unknown storage backend: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            data_dir: "~/.widgetbot".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CorsConfig {
    /// Allowed origins; `*` allows any.
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
        }
    }
}

// ====== Config loading/saving ======

/// Load configuration from environment variables.
///
/// Priority:
/// 1. `WIDGETBOT_CONFIG` env var (full JSON config)
/// 2. File fallback (`~/.widgetbot/config.json`)
///
/// Individual env vars are then applied on top.
pub fn load_config_from_env() -> Config {
    let mut cfg = match std::env::var("WIDGETBOT_CONFIG") {
        Ok(json) => match serde_json::from_str::<Config>(&json) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to parse WIDGETBOT_CONFIG: {}", e);
                load_config(None)
            }
        },
        Err(_) => load_config(None),
    };

    if let Ok(v) = std::env::var("WIDGETBOT_HOST") {
        cfg.server.host = v;
    }
    if let Ok(v) = std::env::var("WIDGETBOT_PORT") {
        match v.parse() {
            Ok(port) => cfg.server.port = port,
            Err(_) => tracing::warn!("Ignoring invalid WIDGETBOT_PORT: {}", v),
        }
    }
    if let Ok(v) = std::env::var("WIDGETBOT_DATA_DIR") {
        cfg.storage.data_dir = v;
    }
    if let Ok(v) = std::env::var("WIDGETBOT_STORAGE") {
        match v.parse() {
            Ok(backend) => cfg.storage.backend = backend,
            Err(e) => tracing::warn!("{}", e),
        }
    }
    if let Ok(v) = std::env::var("WIDGETBOT_ALLOWED_ORIGINS") {
        cfg.cors.allowed_origins = v
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    cfg
}

/// Get the default configuration file path.
pub fn get_config_path() -> PathBuf {
    get_home_dir().join("config.json")
}

fn get_home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".widgetbot")
}

/// Load configuration from file or create default.
pub fn load_config(config_path: Option<&Path>) -> Config {
    let path = config_path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(get_config_path);

    if path.exists() {
        match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Config>(&content) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to parse config from {}: {}", path.display(), e);
                    tracing::warn!("Using default configuration.");
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config from {}: {}", path.display(), e);
                tracing::warn!("Using default configuration.");
            }
        }
    }

    Config::default()
}

/// Save configuration to file.
pub fn save_config(config: &Config, config_path: Option<&Path>) -> Result<(), ConfigError> {
    let path = config_path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(get_config_path);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::Invalid(e.to_string()))?;
    }

    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json).map_err(|e| ConfigError::Invalid(e.to_string()))?;
    Ok(())
}

/// Write a default configuration file unless one already exists.
///
/// Returns whether a file was created.
pub fn init_config(config_path: Option<&Path>) -> Result<bool, ConfigError> {
    let path = config_path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(get_config_path);
    if path.exists() {
        return Ok(false);
    }
    save_config(&Config::default(), Some(&path))?;
    tracing::info!("Created config at {}", path.display());
    Ok(true)
}
