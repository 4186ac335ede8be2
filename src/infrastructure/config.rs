//! Configuration infrastructure
//!
//! Settings are layered with the `config` crate:
//! 1. Built-in defaults (`AppConfig::default()`)
//! 2. Optional JSON/TOML file (per-user file managed by [`ConfigManager`])
//! 3. Environment overrides, e.g. `MEDEQUIP__GATEWAY__PROJECT_ID=abc123`

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tracing::info;

pub const ENV_PREFIX: &str = "MEDEQUIP";
pub const ENV_SEPARATOR: &str = "__";
const APP_DIR_NAME: &str = "medequip-storefront";
const CONFIG_FILE_NAME: &str = "storefront_config.json";

/// Default values, kept in one place so `Default` impls and docs agree
pub mod defaults {
    pub const DATASET: &str = "production";
    pub const API_VERSION: &str = "2024-01-01";
    pub const USE_CDN: bool = true;
    pub const TIMEOUT_SECONDS: u64 = 30;
    pub const MAX_REQUESTS_PER_SECOND: u32 = 10;
    pub const USER_AGENT: &str = concat!("medequip-storefront/", env!("CARGO_PKG_VERSION"));

    pub const PAGE_SIZE: usize = 9;
    pub const LOCAL_SEARCH_MAX_CHARS: usize = 3;
    pub const DEBOUNCE_MS: u64 = 500;
    pub const LIVE_SEARCH_MIN_CHARS: usize = 2;

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_JSON_FORMAT: bool = false;
    pub const LOG_CONSOLE_OUTPUT: bool = true;
    pub const LOG_FILE_OUTPUT: bool = false;
    pub const LOG_FILE_NAME: &str = "storefront.log";
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },

    #[error("Config file I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize configuration: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },

    #[error("Could not resolve the user configuration directory")]
    NoConfigDir,
}

impl ConfigError {
    fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub browsing: BrowsingConfig,
    pub logging: LoggingConfig,
}

/// Content backend connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Sanity project identifier (subdomain of the API host)
    pub project_id: String,
    pub dataset: String,
    /// Dated API version, e.g. "2024-01-01"
    pub api_version: String,
    /// Query the edge cache (`apicdn`) instead of the live API
    pub use_cdn: bool,
    /// Read token for private datasets
    pub token: Option<String>,
    /// Overrides the host derived from `project_id`; used for local mocks
    pub base_url: Option<String>,
    pub timeout_seconds: u64,
    pub max_requests_per_second: u32,
    pub user_agent: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            dataset: defaults::DATASET.to_string(),
            api_version: defaults::API_VERSION.to_string(),
            use_cdn: defaults::USE_CDN,
            token: None,
            base_url: None,
            timeout_seconds: defaults::TIMEOUT_SECONDS,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
            user_agent: defaults::USER_AGENT.to_string(),
        }
    }
}

/// Browsing behaviour shared by every catalog browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowsingConfig {
    pub page_size: usize,
    /// Queries up to this many characters try the cached list first
    pub local_search_max_chars: usize,
    pub debounce_ms: u64,
    /// Live search ignores non-empty input shorter than this
    pub live_search_min_chars: usize,
    pub live_search_enabled: bool,
}

impl Default for BrowsingConfig {
    fn default() -> Self {
        Self {
            page_size: defaults::PAGE_SIZE,
            local_search_max_chars: defaults::LOCAL_SEARCH_MAX_CHARS,
            debounce_ms: defaults::DEBOUNCE_MS,
            live_search_min_chars: defaults::LIVE_SEARCH_MIN_CHARS,
            live_search_enabled: true,
        }
    }
}

/// Logging configuration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,
    pub json_format: bool,
    pub console_output: bool,
    pub file_output: bool,
    /// Directory for the log file; defaults to `<data dir>/medequip-storefront/logs`
    pub directory: Option<PathBuf>,
    pub file_name: String,
    /// Per-target level overrides, e.g. "reqwest": "warn"
    pub module_filters: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let mut module_filters = HashMap::new();
        module_filters.insert("reqwest".to_string(), "info".to_string());
        module_filters.insert("hyper".to_string(), "warn".to_string());
        module_filters.insert("h2".to_string(), "warn".to_string());

        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            directory: None,
            file_name: defaults::LOG_FILE_NAME.to_string(),
            module_filters,
        }
    }
}

impl AppConfig {
    /// Defaults, then `path` (if any), then `MEDEQUIP__*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Like [`AppConfig::load`] but reads overrides from `env` instead of the
    /// process environment when given.
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let gateway = &self.gateway;
        if gateway.project_id.trim().is_empty() && gateway.base_url.is_none() {
            return Err(ConfigError::validation(
                "gateway.project_id is required unless gateway.base_url is set",
            ));
        }
        if gateway.dataset.trim().is_empty() {
            return Err(ConfigError::validation("gateway.dataset must not be empty"));
        }
        if gateway.api_version.trim().is_empty() {
            return Err(ConfigError::validation("gateway.api_version must not be empty"));
        }
        if gateway.timeout_seconds == 0 {
            return Err(ConfigError::validation(
                "gateway.timeout_seconds must be greater than 0",
            ));
        }
        if gateway.max_requests_per_second == 0 {
            return Err(ConfigError::validation(
                "gateway.max_requests_per_second must be greater than 0",
            ));
        }

        let browsing = &self.browsing;
        if browsing.page_size == 0 {
            return Err(ConfigError::validation("browsing.page_size must be greater than 0"));
        }
        if browsing.live_search_min_chars == 0 {
            return Err(ConfigError::validation(
                "browsing.live_search_min_chars must be at least 1",
            ));
        }

        if !self.logging.console_output && !self.logging.file_output {
            return Err(ConfigError::validation(
                "logging needs console_output or file_output enabled",
            ));
        }
        Ok(())
    }
}

/// Owns the per-user config file
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn get_config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn get_app_data_dir() -> Result<PathBuf, ConfigError> {
        dirs::data_local_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn new() -> Result<Self, ConfigError> {
        Ok(Self::with_path(Self::get_config_dir()?.join(CONFIG_FILE_NAME)))
    }

    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Write a default config file when none exists yet. The default config
    /// has no project id, so it is written but not validated.
    pub async fn initialize_on_first_run(&self) -> Result<bool, ConfigError> {
        if fs::try_exists(&self.config_path).await.unwrap_or(false) {
            return Ok(false);
        }

        info!("🎉 First run detected - writing default configuration");
        self.save_config(&AppConfig::default()).await?;
        Ok(true)
    }

    /// Load the managed file with environment overrides applied.
    pub async fn load_config(&self) -> Result<AppConfig, ConfigError> {
        let exists = fs::try_exists(&self.config_path).await.unwrap_or(false);
        let config = AppConfig::load(exists.then_some(self.config_path.as_path()))?;
        info!("Loaded configuration from: {:?}", self.config_path);
        Ok(config)
    }

    pub async fn save_config(&self, config: &AppConfig) -> Result<(), ConfigError> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).await.map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = serde_json::to_string_pretty(config)?;
        fs::write(&self.config_path, content)
            .await
            .map_err(|source| ConfigError::Io {
                path: self.config_path.clone(),
                source,
            })?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults_match_browsing_policy() {
        let config = AppConfig::default();
        assert_eq!(config.browsing.page_size, 9);
        assert_eq!(config.browsing.local_search_max_chars, 3);
        assert_eq!(config.browsing.debounce_ms, 500);
        assert_eq!(config.browsing.live_search_min_chars, 2);
        assert!(config.logging.console_output);
    }

    #[test]
    fn test_default_config_requires_project() {
        let err = AppConfig::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn test_env_overrides_defaults() {
        let config = AppConfig::load_with_env(
            None,
            env(&[
                ("MEDEQUIP__GATEWAY__PROJECT_ID", "abc123"),
                ("MEDEQUIP__GATEWAY__USE_CDN", "false"),
                ("MEDEQUIP__BROWSING__PAGE_SIZE", "12"),
            ]),
        )
        .unwrap();

        assert_eq!(config.gateway.project_id, "abc123");
        assert!(!config.gateway.use_cdn);
        assert_eq!(config.browsing.page_size, 12);
        assert_eq!(config.gateway.dataset, "production");
    }

    #[test]
    fn test_file_source_then_env() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{ "gateway": {{ "project_id": "from-file", "dataset": "staging" }} }}"#
        )
        .unwrap();

        let config = AppConfig::load_with_env(
            Some(file.path()),
            env(&[("MEDEQUIP__GATEWAY__DATASET", "preview")]),
        )
        .unwrap();
        assert_eq!(config.gateway.project_id, "from-file");
        assert_eq!(config.gateway.dataset, "preview");
    }

    #[test]
    fn test_validation_rejects_zero_page_size() {
        let err = AppConfig::load_with_env(
            None,
            env(&[
                ("MEDEQUIP__GATEWAY__PROJECT_ID", "abc123"),
                ("MEDEQUIP__BROWSING__PAGE_SIZE", "0"),
            ]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }

    #[tokio::test]
    async fn test_manager_first_run_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("nested").join("config.json"));

        assert!(manager.initialize_on_first_run().await.unwrap());
        assert!(!manager.initialize_on_first_run().await.unwrap());

        let raw = std::fs::read_to_string(manager.config_path()).unwrap();
        let written: AppConfig = serde_json::from_str(&raw).unwrap();
        assert_eq!(written, AppConfig::default());
    }
}
