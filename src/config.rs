use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};

/// Environment variable naming the base directory for config, state and logs.
pub const HOME_ENV: &str = "HN_READER_HOME";

const STORE_FILE_NAME: &str = "read-state.json";
const LOG_FILE_NAME: &str = "hn-reader.log";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_front_page_url")]
    pub front_page_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_read_flush_threshold")]
    pub read_flush_threshold: usize,

    pub store_dir: Option<String>,
}

fn default_front_page_url() -> String {
    "https://hn.algolia.com/api/v1/search?tags=front_page&hitsPerPage=30".to_string()
}

fn default_user_agent() -> String {
    format!("hn-reader/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout() -> u64 {
    20
}

fn default_read_flush_threshold() -> usize {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            front_page_url: default_front_page_url(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout(),
            read_flush_threshold: default_read_flush_threshold(),
            store_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.read_flush_threshold == 0 {
            return Err(AppError::Config(
                "read_flush_threshold must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::Config(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// `$HN_READER_HOME` if set, otherwise the per-user config directory.
    pub fn base_dir() -> PathBuf {
        match std::env::var_os(HOME_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("hn-reader"),
        }
    }

    pub fn config_path() -> PathBuf {
        Self::base_dir().join("config.toml")
    }

    pub fn log_path() -> PathBuf {
        Self::base_dir().join(LOG_FILE_NAME)
    }

    /// The environment variable wins over `store_dir` so a single shell can
    /// point every file at a scratch directory.
    pub fn store_path(&self) -> PathBuf {
        let dir = match (std::env::var_os(HOME_ENV), &self.store_dir) {
            (Some(dir), _) if !dir.is_empty() => PathBuf::from(dir),
            (_, Some(dir)) => PathBuf::from(dir),
            _ => Self::base_dir(),
        };
        dir.join(STORE_FILE_NAME)
    }
}
