//! Logging system configuration and initialization
//!
//! - console and/or file output (file writer is non-blocking)
//! - optional JSON formatting for the file layer
//! - `RUST_LOG` takes precedence over the configured level
//! - HTTP client internals are held at `info`/`warn` unless the level is `trace`

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use once_cell::sync::Lazy;
use tracing::info;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub use crate::infrastructure::config::LoggingConfig;
use crate::infrastructure::config::ConfigManager;

// Keeps the non-blocking file writer alive for the life of the process.
static LOG_GUARDS: Lazy<Mutex<Vec<WorkerGuard>>> = Lazy::new(|| Mutex::new(Vec::new()));

const CRATE_TARGET: &str = "medequip_storefront_lib";

/// Directory the file layer writes to.
pub fn get_log_directory(config: &LoggingConfig) -> PathBuf {
    config.directory.clone().unwrap_or_else(|| {
        ConfigManager::get_app_data_dir()
            .unwrap_or_else(|_| std::env::temp_dir().join("medequip-storefront"))
            .join("logs")
    })
}

/// Filter from `RUST_LOG`, or from the configured level plus module filters.
pub fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut filter = EnvFilter::try_new(&config.level)
        .map_err(|e| anyhow!("Invalid log level '{}': {}", config.level, e))?;

    if !config.level.to_lowercase().contains("trace") {
        for (target, level) in &config.module_filters {
            let directive = format!("{target}={level}")
                .parse()
                .map_err(|e| anyhow!("Invalid module filter '{target}={level}': {e}"))?;
            filter = filter.add_directive(directive);
        }
    }

    let own = format!("{CRATE_TARGET}={}", config.level)
        .parse()
        .map_err(|e| anyhow!("Invalid log level '{}': {}", config.level, e))?;
    Ok(filter.add_directive(own))
}

/// Initialize logging with default configuration
pub fn init_logging() -> Result<()> {
    init_logging_with_config(&LoggingConfig::default())
}

/// Install the global subscriber. Fails if no output is enabled or a
/// subscriber is already installed.
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let env_filter = build_env_filter(config)?;
    let registry = Registry::default().with(env_filter);

    let console_layer = config.console_output.then(|| {
        fmt::Layer::new()
            .with_writer(std::io::stdout)
            .with_target(false)
    });

    let (json_file_layer, plain_file_layer, log_dir) = if config.file_output {
        let log_dir = get_log_directory(config);
        std::fs::create_dir_all(&log_dir)
            .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;

        let (file_writer, guard) = non_blocking(rolling::never(&log_dir, &config.file_name));
        LOG_GUARDS
            .lock()
            .map_err(|_| anyhow!("Log guard registry poisoned"))?
            .push(guard);

        if config.json_format {
            let layer = fmt::Layer::new()
                .json()
                .with_writer(file_writer)
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false);
            (Some(layer), None, Some(log_dir))
        } else {
            let layer = fmt::Layer::new()
                .with_writer(file_writer)
                .with_target(false)
                .with_ansi(false);
            (None, Some(layer), Some(log_dir))
        }
    } else {
        (None, None, None)
    };

    if console_layer.is_none() && log_dir.is_none() {
        return Err(anyhow!("No logging output configured"));
    }

    registry
        .with(console_layer)
        .with(json_file_layer)
        .with(plain_file_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    info!("Logging system initialized");
    info!("Log level: {}", config.level);
    if let Some(dir) = log_dir {
        info!("Log directory: {:?}", dir);
    }
    Ok(())
}
