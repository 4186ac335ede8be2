//! Infrastructure layer: configuration, logging and the content backend client

pub mod config;
pub mod groq;
pub mod logging;
pub mod sanity_client;

pub use config::{AppConfig, BrowsingConfig, ConfigManager, GatewayConfig, LoggingConfig};
pub use sanity_client::SanityGateway;
