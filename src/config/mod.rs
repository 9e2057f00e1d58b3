use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::import::DEFAULT_MAX_FILE_BYTES;
use crate::list::DEFAULT_PAGE_SIZE;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub list: ListConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Origin of the UniVault API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the persisted session and preferences
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
        }
    }
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("./.univault")
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListConfig {
    /// Items requested per page (default: 20)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Quiet period before a search term is applied, in milliseconds (default: 500)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl ListConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_debounce_ms() -> u64 {
    500
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    /// Largest spreadsheet accepted for upload, in bytes (default: 5 MiB)
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

fn default_max_file_bytes() -> u64 {
    DEFAULT_MAX_FILE_BYTES
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml(&content)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse configuration file")
    }

    /// Non-fatal problems worth reporting
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let base_url = self.api.base_url.as_str();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            warnings.push(format!(
                "api.base_url should start with http:// or https:// (got '{}')",
                base_url
            ));
        } else if base_url.starts_with("http://")
            && !(base_url.contains("localhost") || base_url.contains("127.0.0.1"))
        {
            warnings.push("api.base_url uses plain HTTP; bearer tokens travel unencrypted".to_string());
        }
        if self.api.timeout_secs == 0 {
            warnings.push("api.timeout_secs is 0; every request will time out".to_string());
        }
        if self.list.page_size == 0 {
            warnings.push("list.page_size is 0; lists will always be empty".to_string());
        }
        if self.import.max_file_bytes == 0 {
            warnings.push("import.max_file_bytes is 0; every import will be rejected".to_string());
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:5000");
        assert_eq!(config.list.page_size, 20);
        assert_eq!(config.list.debounce(), Duration::from_millis(500));
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [api]
            base_url = "https://archives.univ.sn"

            [list]
            debounce_ms = 300
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://archives.univ.sn");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.list.debounce_ms, 300);
        assert_eq!(config.list.page_size, 20);
    }

    #[test]
    fn test_validate_warnings() {
        let mut config = Config::default();
        config.api.base_url = "archives.univ.sn".to_string();
        config.list.page_size = 0;
        assert_eq!(config.validate().len(), 2);

        config.api.base_url = "http://archives.univ.sn".to_string();
        config.list.page_size = 20;
        assert!(config.validate()[0].contains("plain HTTP"));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load(Path::new("/nonexistent/univault.toml")).unwrap();
        assert_eq!(config.import.max_file_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        assert!(Config::from_toml("[api\nbase_url=").is_err());
    }
}
